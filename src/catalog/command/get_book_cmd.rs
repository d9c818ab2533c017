use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::books::dto::BookDto;
use crate::catalog::domain::CatalogService;
use crate::core::command::{Command, CommandError};

pub struct GetBookCommand {
    catalog_service: Box<dyn CatalogService>,
}

impl GetBookCommand {
    pub fn new(catalog_service: Box<dyn CatalogService>) -> Self {
        Self {
            catalog_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GetBookCommandRequest {
    pub isbn: String,
}

impl GetBookCommandRequest {
    pub fn new(isbn: &str) -> Self {
        Self {
            isbn: isbn.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetBookCommandResponse {
    pub book: BookDto,
}

impl GetBookCommandResponse {
    pub fn new(book: BookDto) -> Self {
        Self {
            book,
        }
    }
}

#[async_trait]
impl Command<GetBookCommandRequest, GetBookCommandResponse> for GetBookCommand {
    async fn execute(&self, req: GetBookCommandRequest) -> Result<GetBookCommandResponse, CommandError> {
        self.catalog_service.find_book(req.isbn.as_str())
            .await.map_err(CommandError::from).map(GetBookCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use serde_json::json;
    use crate::catalog::command::get_book_cmd::{GetBookCommand, GetBookCommandRequest};
    use crate::catalog::domain::CatalogService;
    use crate::catalog::domain::fetcher::StaticMetadataFetcher;
    use crate::catalog::factory::create_catalog_service_with;
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::repository::StoreHandle;
    use crate::utils::date::SystemClock;

    #[tokio::test]
    async fn test_should_get_book_once_synced() {
        let config = Configuration::new("test");
        let handle = StoreHandle::memory();
        let upstream = StaticMetadataFetcher::new()
            .with_volume("9780547928227", json!({"volumeInfo": {"title": "The Hobbit", "authors": ["J. R. R. Tolkien"]}}));
        let cmd = GetBookCommand::new(
            create_catalog_service_with(&config, &handle, Box::new(StaticMetadataFetcher::new()), Arc::new(SystemClock)).await);
        let res = cmd.execute(GetBookCommandRequest::new("9780547928227")).await;
        assert!(matches!(res, Err(CommandError::NotFound { .. })));

        let catalog_svc = create_catalog_service_with(&config, &handle, Box::new(upstream), Arc::new(SystemClock)).await;
        catalog_svc.sync_book("9780547928227").await.expect("should sync book");
        let res = cmd.execute(GetBookCommandRequest::new("9780547928227")).await.expect("should get book");
        assert_eq!("The Hobbit", res.book.title.as_str());
        assert_eq!(0, res.book.available_copies);
    }
}
