use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::Value;
use crate::catalog::command::add_copies_cmd::{AddCopiesCommand, AddCopiesCommandRequest, AddCopiesCommandResponse};
use crate::catalog::command::get_book_cmd::{GetBookCommand, GetBookCommandRequest, GetBookCommandResponse};
use crate::catalog::command::search_books_cmd::{SearchBooksCommand, SearchBooksCommandRequest, SearchBooksCommandResponse};
use crate::catalog::command::sync_book_cmd::{SyncBookCommand, SyncBookCommandRequest, SyncBookCommandResponse};
use crate::catalog::domain::CatalogService;
use crate::catalog::factory;
use crate::core::command::Command;
use crate::core::controller::{AppState, json_to_server_error, ServerError};

async fn build_service(state: &AppState) -> Box<dyn CatalogService> {
    factory::create_catalog_service(&state.config, &state.handle).await
}

pub async fn sync_book(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<SyncBookCommandResponse>, ServerError> {
    let req: SyncBookCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let svc = build_service(&state).await;
    let res = SyncBookCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub async fn find_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>) -> Result<Json<GetBookCommandResponse>, ServerError> {
    let req = GetBookCommandRequest { isbn };
    let svc = build_service(&state).await;
    let res = GetBookCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub async fn add_copies(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
    json: Json<Value>) -> Result<Json<AddCopiesCommandResponse>, ServerError> {
    let mut req: AddCopiesCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    req.isbn = isbn;
    let svc = build_service(&state).await;
    let res = AddCopiesCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub async fn search_books(
    State(state): State<AppState>,
    Path(term): Path<String>) -> Result<Json<SearchBooksCommandResponse>, ServerError> {
    let req = SearchBooksCommandRequest { term };
    let svc = build_service(&state).await;
    let res = SearchBooksCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}
