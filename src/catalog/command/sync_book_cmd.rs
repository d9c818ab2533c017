use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::books::dto::BookDto;
use crate::catalog::domain::CatalogService;
use crate::core::command::{Command, CommandError};

pub struct SyncBookCommand {
    catalog_service: Box<dyn CatalogService>,
}

impl SyncBookCommand {
    pub fn new(catalog_service: Box<dyn CatalogService>) -> Self {
        Self {
            catalog_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SyncBookCommandRequest {
    isbn: String,
}

impl SyncBookCommandRequest {
    pub fn new(isbn: &str) -> Self {
        Self {
            isbn: isbn.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SyncBookCommandResponse {
    pub book: BookDto,
}

impl SyncBookCommandResponse {
    pub fn new(book: BookDto) -> Self {
        Self {
            book,
        }
    }
}

#[async_trait]
impl Command<SyncBookCommandRequest, SyncBookCommandResponse> for SyncBookCommand {
    async fn execute(&self, req: SyncBookCommandRequest) -> Result<SyncBookCommandResponse, CommandError> {
        self.catalog_service.sync_book(req.isbn.as_str())
            .await.map_err(CommandError::from).map(SyncBookCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use serde_json::json;
    use crate::catalog::command::sync_book_cmd::{SyncBookCommand, SyncBookCommandRequest};
    use crate::catalog::domain::fetcher::StaticMetadataFetcher;
    use crate::catalog::factory::create_catalog_service_with;
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::repository::StoreHandle;
    use crate::utils::date::SystemClock;

    #[tokio::test]
    async fn test_should_run_sync_book() {
        let fetcher = StaticMetadataFetcher::new()
            .with_volume("isbn", json!({"volumeInfo": {"title": "test book", "authors": ["author"]}}));
        let svc = create_catalog_service_with(&Configuration::new("test"), &StoreHandle::memory(),
                                              Box::new(fetcher), Arc::new(SystemClock)).await;
        let cmd = SyncBookCommand::new(svc);
        let res = cmd.execute(SyncBookCommandRequest::new("isbn")).await.expect("should sync book");
        assert_eq!("test book", res.book.title.as_str());
        let res = cmd.execute(SyncBookCommandRequest::new("unknown")).await;
        assert!(matches!(res, Err(CommandError::NotFound { .. })));
    }
}
