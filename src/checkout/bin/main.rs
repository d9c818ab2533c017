use axum::{
    routing::{get, post},
    Router,
};
use lambda_http::{run, Error};
use circulation::checkout::controller::{active_loans, checkout_book, return_book};
use circulation::core::controller::AppState;
use circulation::utils::logs::setup_tracing;

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_tracing();

    let state = AppState::load("main").await?;

    let app = Router::new()
        .route("/checkout", post(checkout_book))
        .route("/checkout/return", post(return_book))
        .route("/checkout/patron/:id", get(active_loans))
        .with_state(state);

    run(app).await
}
