use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::patrons::domain::PatronService;
use crate::patrons::dto::PatronSummary;

pub struct GetPatronCommand {
    patron_service: Box<dyn PatronService>,
}

impl GetPatronCommand {
    pub fn new(patron_service: Box<dyn PatronService>) -> Self {
        Self {
            patron_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GetPatronCommandRequest {
    pub patron_id: i64,
}

impl GetPatronCommandRequest {
    pub fn new(patron_id: i64) -> Self {
        Self {
            patron_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetPatronCommandResponse {
    pub summary: PatronSummary,
}

impl GetPatronCommandResponse {
    pub fn new(summary: PatronSummary) -> Self {
        Self {
            summary,
        }
    }
}

#[async_trait]
impl Command<GetPatronCommandRequest, GetPatronCommandResponse> for GetPatronCommand {
    async fn execute(&self, req: GetPatronCommandRequest) -> Result<GetPatronCommandResponse, CommandError> {
        self.patron_service.find_patron_by_id(req.patron_id)
            .await.map_err(CommandError::from).map(GetPatronCommandResponse::new)
    }
}
