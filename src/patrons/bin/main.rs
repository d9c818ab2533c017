use axum::{
    routing::{get, post},
    Router,
};
use lambda_http::{run, Error};
use circulation::core::controller::AppState;
use circulation::patrons::controller::{find_patron_by_email, find_patron_by_id, register_patron};
use circulation::utils::logs::setup_tracing;

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_tracing();

    let state = AppState::load("main").await?;

    let app = Router::new()
        .route("/patrons", post(register_patron))
        .route("/patrons/:id", get(find_patron_by_id))
        .route("/patrons/email/:email", get(find_patron_by_email))
        .with_state(state);

    run(app).await
}
