use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::patrons::domain::PatronService;
use crate::patrons::dto::PatronSummary;

pub struct FindPatronCommand {
    patron_service: Box<dyn PatronService>,
}

impl FindPatronCommand {
    pub fn new(patron_service: Box<dyn PatronService>) -> Self {
        Self {
            patron_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FindPatronCommandRequest {
    pub email: String,
}

impl FindPatronCommandRequest {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FindPatronCommandResponse {
    pub summary: PatronSummary,
}

impl FindPatronCommandResponse {
    pub fn new(summary: PatronSummary) -> Self {
        Self {
            summary,
        }
    }
}

#[async_trait]
impl Command<FindPatronCommandRequest, FindPatronCommandResponse> for FindPatronCommand {
    async fn execute(&self, req: FindPatronCommandRequest) -> Result<FindPatronCommandResponse, CommandError> {
        self.patron_service.find_patron_by_email(req.email.as_str())
            .await.map_err(CommandError::from).map(FindPatronCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::command::Command;
    use crate::core::domain::Configuration;
    use crate::core::repository::StoreHandle;
    use crate::patrons::command::find_patron_cmd::{FindPatronCommand, FindPatronCommandRequest};
    use crate::patrons::factory::create_patron_service;

    #[tokio::test]
    async fn test_should_run_find_patron() {
        let handle = StoreHandle::memory();
        let config = Configuration::new("test");
        create_patron_service(&config, &handle).await
            .register_patron("Ada", "Lovelace", "ada@example.org").await.expect("should register");
        let cmd = FindPatronCommand::new(create_patron_service(&config, &handle).await);
        let res = cmd.execute(FindPatronCommandRequest::new("ada@example.org")).await.expect("should find patron");
        assert_eq!("Lovelace", res.summary.patron.last_name.as_str());
    }
}
