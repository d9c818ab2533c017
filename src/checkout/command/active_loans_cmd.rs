use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::checkout::domain::CirculationService;
use crate::checkout::dto::ActiveLoanDto;
use crate::core::command::{Command, CommandError};

pub struct ActiveLoansCommand {
    circulation_service: Box<dyn CirculationService>,
}

impl ActiveLoansCommand {
    pub fn new(circulation_service: Box<dyn CirculationService>) -> Self {
        Self {
            circulation_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ActiveLoansCommandRequest {
    patron_id: i64,
}

impl ActiveLoansCommandRequest {
    pub fn new(patron_id: i64) -> Self {
        Self {
            patron_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActiveLoansCommandResponse {
    pub patron_id: i64,
    pub loans: Vec<ActiveLoanDto>,
}

#[async_trait]
impl Command<ActiveLoansCommandRequest, ActiveLoansCommandResponse> for ActiveLoansCommand {
    async fn execute(&self, req: ActiveLoansCommandRequest) -> Result<ActiveLoansCommandResponse, CommandError> {
        let loans = self.circulation_service.active_loans_for(req.patron_id).await.map_err(CommandError::from)?;
        Ok(ActiveLoansCommandResponse { patron_id: req.patron_id, loans })
    }
}
