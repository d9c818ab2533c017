use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::Value;
use crate::core::command::Command;
use crate::core::controller::{AppState, json_to_server_error, ServerError};
use crate::patrons::command::find_patron_cmd::{FindPatronCommand, FindPatronCommandRequest, FindPatronCommandResponse};
use crate::patrons::command::get_patron_cmd::{GetPatronCommand, GetPatronCommandRequest, GetPatronCommandResponse};
use crate::patrons::command::register_patron_cmd::{RegisterPatronCommand, RegisterPatronCommandRequest, RegisterPatronCommandResponse};
use crate::patrons::domain::PatronService;
use crate::patrons::factory;

async fn build_service(state: &AppState) -> Box<dyn PatronService> {
    factory::create_patron_service(&state.config, &state.handle).await
}

pub async fn register_patron(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<RegisterPatronCommandResponse>, ServerError> {
    let req: RegisterPatronCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let svc = build_service(&state).await;
    let res = RegisterPatronCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub async fn find_patron_by_id(
    State(state): State<AppState>,
    Path(patron_id): Path<i64>) -> Result<Json<GetPatronCommandResponse>, ServerError> {
    let req = GetPatronCommandRequest { patron_id };
    let svc = build_service(&state).await;
    let res = GetPatronCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

pub async fn find_patron_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>) -> Result<Json<FindPatronCommandResponse>, ServerError> {
    let req = FindPatronCommandRequest { email };
    let svc = build_service(&state).await;
    let res = FindPatronCommand::new(svc).execute(req).await?;
    Ok(Json(res))
}

#[cfg(test)]
mod tests {
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::Json;
    use serde_json::json;
    use crate::core::controller::AppState;
    use crate::core::domain::Configuration;
    use crate::core::repository::StoreHandle;
    use crate::patrons::controller::{find_patron_by_email, find_patron_by_id, register_patron};

    #[tokio::test]
    async fn test_should_register_and_find_patron() {
        let state = AppState::new(Configuration::new("test"), StoreHandle::memory());
        let res = register_patron(State(state.clone()),
                                  Json(json!({"first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.org"})))
            .await.expect("should register");
        let patron_id = res.0.patron.patron_id;

        let res = find_patron_by_id(State(state.clone()), Path(patron_id)).await.expect("should find");
        assert_eq!("ada@example.org", res.0.summary.patron.email.as_str());
        let res = find_patron_by_email(State(state.clone()), Path("ada@example.org".to_string())).await.expect("should find");
        assert_eq!(patron_id, res.0.summary.patron.patron_id);

        let res = register_patron(State(state.clone()), Json(json!({"email": "ada@example.org"}))).await;
        assert_eq!(StatusCode::CONFLICT, res.err().expect("should fail").0);
        let res = register_patron(State(state), Json(json!({"first_name": "Ada"}))).await;
        assert_eq!(StatusCode::BAD_REQUEST, res.err().expect("should fail").0);
    }
}
