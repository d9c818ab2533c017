use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::books::dto::BookDto;
use crate::catalog::domain::CatalogService;
use crate::core::command::{Command, CommandError};

pub struct AddCopiesCommand {
    catalog_service: Box<dyn CatalogService>,
}

impl AddCopiesCommand {
    pub fn new(catalog_service: Box<dyn CatalogService>) -> Self {
        Self {
            catalog_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCopiesCommandRequest {
    #[serde(default)]
    pub isbn: String,
    pub count: i64,
}

impl AddCopiesCommandRequest {
    pub fn new(isbn: &str, count: i64) -> Self {
        Self {
            isbn: isbn.to_string(),
            count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddCopiesCommandResponse {
    pub book: BookDto,
}

impl AddCopiesCommandResponse {
    pub fn new(book: BookDto) -> Self {
        Self {
            book,
        }
    }
}

#[async_trait]
impl Command<AddCopiesCommandRequest, AddCopiesCommandResponse> for AddCopiesCommand {
    async fn execute(&self, req: AddCopiesCommandRequest) -> Result<AddCopiesCommandResponse, CommandError> {
        self.catalog_service.add_copies(req.isbn.as_str(), req.count)
            .await.map_err(CommandError::from).map(AddCopiesCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use serde_json::json;
    use crate::catalog::command::add_copies_cmd::{AddCopiesCommand, AddCopiesCommandRequest};
    use crate::catalog::domain::fetcher::StaticMetadataFetcher;
    use crate::catalog::factory::create_catalog_service_with;
    use crate::core::command::{Command, CommandError};
    use crate::core::domain::Configuration;
    use crate::core::repository::StoreHandle;
    use crate::utils::date::SystemClock;

    #[tokio::test]
    async fn test_should_run_add_copies() {
        let handle = StoreHandle::memory();
        let config = Configuration::new("test");
        let fetcher = StaticMetadataFetcher::new()
            .with_volume("isbn", json!({"volumeInfo": {"title": "test book", "authors": ["author"]}}));
        let svc = create_catalog_service_with(&config, &handle, Box::new(fetcher), Arc::new(SystemClock)).await;
        svc.sync_book("isbn").await.expect("should sync book");

        let cmd = AddCopiesCommand::new(svc);
        let res = cmd.execute(AddCopiesCommandRequest::new("isbn", 2)).await.expect("should add copies");
        assert_eq!(2, res.book.available_copies);
        let res = cmd.execute(AddCopiesCommandRequest::new("isbn", -1)).await;
        assert!(matches!(res, Err(CommandError::Validation { .. })));
    }
}
