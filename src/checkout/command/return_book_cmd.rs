use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::checkout::domain::CirculationService;
use crate::checkout::dto::ReturnReceipt;
use crate::core::command::{Command, CommandError};

pub struct ReturnBookCommand {
    circulation_service: Box<dyn CirculationService>,
}

impl ReturnBookCommand {
    pub fn new(circulation_service: Box<dyn CirculationService>) -> Self {
        Self {
            circulation_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReturnBookCommandRequest {
    isbn: String,
    patron_id: i64,
}

impl ReturnBookCommandRequest {
    pub fn new(isbn: &str, patron_id: i64) -> Self {
        Self {
            isbn: isbn.to_string(),
            patron_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReturnBookCommandResponse {
    pub receipt: ReturnReceipt,
}

impl ReturnBookCommandResponse {
    pub fn new(receipt: ReturnReceipt) -> Self {
        Self {
            receipt,
        }
    }
}

#[async_trait]
impl Command<ReturnBookCommandRequest, ReturnBookCommandResponse> for ReturnBookCommand {
    async fn execute(&self, req: ReturnBookCommandRequest) -> Result<ReturnBookCommandResponse, CommandError> {
        self.circulation_service.returned(req.isbn.as_str(), req.patron_id)
            .await.map_err(CommandError::from).map(ReturnBookCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use crate::books::domain::model::BookEntity;
    use crate::books::factory::create_book_repository;
    use crate::checkout::command::checkout_book_cmd::{CheckoutBookCommand, CheckoutBookCommandRequest};
    use crate::checkout::command::return_book_cmd::{ReturnBookCommand, ReturnBookCommandRequest};
    use crate::checkout::factory::create_circulation_service;
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::library::LoanStatus;
    use crate::core::repository::{Repository, StoreHandle};

    #[tokio::test]
    async fn test_should_run_return_book() {
        let handle = StoreHandle::memory();
        let config = Configuration::new("test");
        let books = create_book_repository(&handle);
        let book = BookEntity::new("isbn", "test book", None, None, vec![], Utc::now().naive_utc());
        books.create(&book).await.expect("should create book");
        books.add_copies("isbn", 1, book.created_at).await.expect("should add copies");

        let checkout_cmd = CheckoutBookCommand::new(create_circulation_service(&config, &handle).await);
        let return_cmd = ReturnBookCommand::new(create_circulation_service(&config, &handle).await);
        checkout_cmd.execute(CheckoutBookCommandRequest::new("isbn", 3)).await.expect("should checkout book");
        let res = return_cmd.execute(ReturnBookCommandRequest::new("isbn", 3)).await.expect("should return book");
        assert_eq!(LoanStatus::Returned, res.receipt.loan.loan_status);
        assert!(!res.receipt.fine_assessed);

        let res = return_cmd.execute(ReturnBookCommandRequest::new("isbn", 3)).await;
        assert!(matches!(res, Err(CommandError::Conflict { .. })));
    }
}
