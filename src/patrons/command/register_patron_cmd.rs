use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::patrons::domain::PatronService;
use crate::patrons::dto::PatronDto;

pub struct RegisterPatronCommand {
    patron_service: Box<dyn PatronService>,
}

impl RegisterPatronCommand {
    pub fn new(patron_service: Box<dyn PatronService>) -> Self {
        Self {
            patron_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterPatronCommandRequest {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    email: String,
}

impl RegisterPatronCommandRequest {
    pub fn new(first_name: &str, last_name: &str, email: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterPatronCommandResponse {
    pub patron: PatronDto,
}

impl RegisterPatronCommandResponse {
    pub fn new(patron: PatronDto) -> Self {
        Self {
            patron,
        }
    }
}

#[async_trait]
impl Command<RegisterPatronCommandRequest, RegisterPatronCommandResponse> for RegisterPatronCommand {
    async fn execute(&self, req: RegisterPatronCommandRequest) -> Result<RegisterPatronCommandResponse, CommandError> {
        self.patron_service.register_patron(req.first_name.as_str(), req.last_name.as_str(), req.email.as_str())
            .await.map_err(CommandError::from).map(RegisterPatronCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::repository::StoreHandle;
    use crate::patrons::command::register_patron_cmd::{RegisterPatronCommand, RegisterPatronCommandRequest};
    use crate::patrons::factory::create_patron_service;

    #[tokio::test]
    async fn test_should_run_register_patron() {
        let svc = create_patron_service(&Configuration::new("test"), &StoreHandle::memory()).await;
        let cmd = RegisterPatronCommand::new(svc);
        let res = cmd.execute(RegisterPatronCommandRequest::new("Ada", "Lovelace", "ada@example.org"))
            .await.expect("should register patron");
        assert_eq!(1, res.patron.patron_id);
        let res = cmd.execute(RegisterPatronCommandRequest::new("Ada", "Lovelace", "ada@example.org")).await;
        assert!(matches!(res, Err(CommandError::DuplicateKey { .. })));
    }
}
