use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::checkout::domain::CirculationService;
use crate::checkout::dto::LoanDto;
use crate::core::command::{Command, CommandError};

pub struct CheckoutBookCommand {
    circulation_service: Box<dyn CirculationService>,
}

impl CheckoutBookCommand {
    pub fn new(circulation_service: Box<dyn CirculationService>) -> Self {
        Self {
            circulation_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckoutBookCommandRequest {
    isbn: String,
    patron_id: i64,
}

impl CheckoutBookCommandRequest {
    pub fn new(isbn: &str, patron_id: i64) -> Self {
        Self {
            isbn: isbn.to_string(),
            patron_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckoutBookCommandResponse {
    pub loan: LoanDto,
}

impl CheckoutBookCommandResponse {
    pub fn new(loan: LoanDto) -> Self {
        Self {
            loan,
        }
    }
}

#[async_trait]
impl Command<CheckoutBookCommandRequest, CheckoutBookCommandResponse> for CheckoutBookCommand {
    async fn execute(&self, req: CheckoutBookCommandRequest) -> Result<CheckoutBookCommandResponse, CommandError> {
        self.circulation_service.checkout(req.isbn.as_str(), req.patron_id)
            .await.map_err(CommandError::from).map(CheckoutBookCommandResponse::new)
    }
}
