use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::Value;
use crate::checkout::command::active_loans_cmd::{ActiveLoansCommand, ActiveLoansCommandRequest, ActiveLoansCommandResponse};
use crate::checkout::command::checkout_book_cmd::{CheckoutBookCommand, CheckoutBookCommandRequest, CheckoutBookCommandResponse};
use crate::checkout::command::return_book_cmd::{ReturnBookCommand, ReturnBookCommandRequest, ReturnBookCommandResponse};
use crate::checkout::domain::CirculationService;
use crate::checkout::factory;
use crate::core::command::Command;
use crate::core::controller::{AppState, json_to_server_error, ServerError};

async fn build_service(state: &AppState) -> Box<dyn CirculationService> {
    factory::create_circulation_service(&state.config, &state.handle).await
}

pub async fn checkout_book(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<CheckoutBookCommandResponse>, ServerError> {
    let req: CheckoutBookCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let svc = build_service(&state).await;
    let res = CheckoutBookCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub async fn return_book(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<ReturnBookCommandResponse>, ServerError> {
    let req: ReturnBookCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let svc = build_service(&state).await;
    let res = ReturnBookCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub async fn active_loans(
    State(state): State<AppState>,
    Path(patron_id): Path<i64>) -> Result<Json<ActiveLoansCommandResponse>, ServerError> {
    let svc = build_service(&state).await;
    let res = ActiveLoansCommand::new(svc).execute(ActiveLoansCommandRequest::new(patron_id)).await?;
    Ok(Json(res))
}

#[cfg(test)]
mod tests {
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::Json;
    use serde_json::json;
    use crate::checkout::controller::{active_loans, checkout_book, return_book};
    use crate::core::controller::AppState;
    use crate::core::domain::Configuration;
    use crate::core::repository::StoreHandle;

    fn state() -> AppState {
        AppState::new(Configuration::new("test"), StoreHandle::memory())
    }

    #[tokio::test]
    async fn test_should_reject_malformed_request() {
        let res = checkout_book(State(state()), Json(json!({"isbn": "isbn"}))).await;
        assert_eq!(StatusCode::BAD_REQUEST, res.err().expect("should fail").0);
    }

    #[tokio::test]
    async fn test_should_map_circulation_errors() {
        let res = checkout_book(State(state()), Json(json!({"isbn": "missing", "patron_id": 1}))).await;
        assert_eq!(StatusCode::NOT_FOUND, res.err().expect("should fail").0);
        let res = return_book(State(state()), Json(json!({"isbn": "missing", "patron_id": 1}))).await;
        assert_eq!(StatusCode::CONFLICT, res.err().expect("should fail").0);
    }

    #[tokio::test]
    async fn test_should_list_active_loans() {
        let res = active_loans(State(state()), Path(5)).await.expect("should list loans");
        assert_eq!(5, res.0.patron_id);
    }
}
