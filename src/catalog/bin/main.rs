use axum::{
    routing::{get, post},
    Router,
};
use lambda_http::{run, Error};
use circulation::catalog::controller::{add_copies, find_book, search_books, sync_book};
use circulation::core::controller::AppState;
use circulation::utils::logs::setup_tracing;

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_tracing();

    let state = AppState::load("main").await?;

    let app = Router::new()
        .route("/catalog", post(sync_book))
        .route("/catalog/:isbn", get(find_book))
        .route("/catalog/:isbn/copies", post(add_copies))
        .route("/catalog/search/:term", get(search_books))
        .with_state(state);

    run(app).await
}
