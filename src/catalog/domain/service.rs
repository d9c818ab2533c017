use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use tracing::{info, warn};
use crate::books::domain::model::BookEntity;
use crate::books::dto::BookDto;
use crate::books::repository::{BookRepository, MAX_SEARCH_RESULTS};
use crate::catalog::domain::CatalogService;
use crate::catalog::domain::fetcher::MetadataFetcher;
use crate::core::domain::Configuration;
use crate::core::events::DomainEvent;
use crate::core::library::{LibraryError, LibraryResult};
use crate::gateway::events::EventPublisher;
use crate::utils::date::Clock;

pub(crate) struct CatalogServiceImpl {
    branch_id: String,
    book_repository: Box<dyn BookRepository>,
    metadata_fetcher: Box<dyn MetadataFetcher>,
    events_publisher: Box<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl CatalogServiceImpl {
    pub(crate) fn new(config: &Configuration, book_repository: Box<dyn BookRepository>,
                      metadata_fetcher: Box<dyn MetadataFetcher>,
                      events_publisher: Box<dyn EventPublisher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            branch_id: config.branch_id.to_string(),
            book_repository,
            metadata_fetcher,
            events_publisher,
            clock,
        }
    }

    async fn publish(&self, event: serde_json::Result<DomainEvent>) {
        match event {
            Ok(event) => {
                if let Err(err) = self.events_publisher.publish(&event).await {
                    warn!("failed to publish {} {}: {}", event.name, event.key, err);
                }
            }
            Err(err) => {
                warn!("failed to build event: {}", err);
            }
        }
    }

    fn event_metadata(&self) -> HashMap<String, String> {
        HashMap::from([("branch_id".to_string(), self.branch_id.to_string())])
    }
}

fn validate_isbn(isbn: &str) -> LibraryResult<()> {
    if isbn.trim().is_empty() {
        return Err(LibraryError::validation("isbn must not be empty", Some("400".to_string())));
    }
    Ok(())
}

#[async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn sync_book(&self, isbn: &str) -> LibraryResult<BookDto> {
        validate_isbn(isbn)?;
        match self.book_repository.get(isbn).await {
            Ok(book) => return Ok(BookDto::from(&book)),
            Err(LibraryError::NotFound { .. }) => {}
            Err(err) => return Err(err),
        }
        let metadata = self.metadata_fetcher.fetch_metadata(isbn).await?;
        metadata.validate()?;
        let book = BookEntity::new(isbn, metadata.title.as_str(), metadata.publisher.clone(),
                                   metadata.publication_year, metadata.authors.clone(), self.clock.now());
        match self.book_repository.create(&book).await {
            Ok(_) => {}
            // synced concurrently by another caller
            Err(LibraryError::DuplicateKey { .. }) => {
                return self.book_repository.get(isbn).await.map(|b| BookDto::from(&b));
            }
            Err(err) => return Err(err),
        }
        info!("synced {} \"{}\" into the catalog", isbn, book.title);
        let dto = BookDto::from(&book);
        self.publish(DomainEvent::added("book_synced", "catalog", isbn, &self.event_metadata(), &dto)).await;
        Ok(dto)
    }

    async fn find_book(&self, isbn: &str) -> LibraryResult<BookDto> {
        self.book_repository.get(isbn).await.map(|b| BookDto::from(&b))
    }

    async fn add_copies(&self, isbn: &str, count: i64) -> LibraryResult<BookDto> {
        validate_isbn(isbn)?;
        if count <= 0 {
            return Err(LibraryError::validation(
                format!("copies to add must be positive but was {}", count).as_str(), Some("400".to_string())));
        }
        let book = self.book_repository.add_copies(isbn, count, self.clock.now()).await?;
        info!("added {} copies of {}, {} of {} on the shelf", count, isbn, book.available_copies, book.total_copies);
        let dto = BookDto::from(&book);
        self.publish(DomainEvent::updated("copies_added", "catalog", isbn, &self.event_metadata(), &dto)).await;
        Ok(dto)
    }

    async fn search_available(&self, term: &str) -> LibraryResult<Vec<BookDto>> {
        let books = self.book_repository.search_available(term.trim(), MAX_SEARCH_RESULTS).await?;
        Ok(books.iter().map(BookDto::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::json;
    use crate::books::factory::create_book_repository;
    use crate::catalog::domain::CatalogService;
    use crate::catalog::domain::fetcher::StaticMetadataFetcher;
    use crate::catalog::domain::service::CatalogServiceImpl;
    use crate::core::domain::Configuration;
    use crate::core::library::LibraryError;
    use crate::core::repository::StoreHandle;
    use crate::gateway::logs::LogPublisher;
    use crate::utils::date::ManualClock;

    fn catalog_service(publisher: &LogPublisher) -> CatalogServiceImpl {
        let fetcher = StaticMetadataFetcher::new()
            .with_volume("9780441013593", json!({"volumeInfo": {
                "title": "Dune", "authors": ["Frank Herbert"], "publisher": "Ace", "publishedDate": "1990-09-01"}}))
            .with_volume("9780441172719", json!({"volumeInfo": {
                "title": "Dune Messiah", "authors": ["Frank Herbert"]}}))
            .with_volume("0000000000", json!({"volumeInfo": {"title": "No Author"}}));
        let handle = StoreHandle::memory();
        CatalogServiceImpl::new(&Configuration::new("test"), create_book_repository(&handle),
                                Box::new(fetcher), Box::new(publisher.clone()),
                                Arc::new(ManualClock::starting_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())))
    }

    #[tokio::test]
    async fn test_should_sync_book_without_copies() {
        let publisher = LogPublisher::new();
        let catalog_svc = catalog_service(&publisher);
        let book = catalog_svc.sync_book("9780441013593").await.expect("should sync book");
        assert_eq!("Dune", book.title.as_str());
        assert_eq!(Some(1990), book.publication_year);
        assert_eq!(0, book.total_copies);
        assert_eq!(0, book.available_copies);

        // a second sync returns the stored book
        let again = catalog_svc.sync_book("9780441013593").await.expect("should find book");
        assert_eq!(book, again);
        assert_eq!(vec!["book_synced".to_string()], publisher.published_names());
    }

    #[tokio::test]
    async fn test_should_reject_unknown_or_incomplete_metadata() {
        let catalog_svc = catalog_service(&LogPublisher::new());
        assert!(matches!(catalog_svc.sync_book("missing").await, Err(LibraryError::NotFound { .. })));
        assert!(matches!(catalog_svc.sync_book("0000000000").await, Err(LibraryError::Validation { .. })));
        assert!(matches!(catalog_svc.find_book("0000000000").await, Err(LibraryError::NotFound { .. })));
        assert!(matches!(catalog_svc.sync_book(" ").await, Err(LibraryError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_should_add_copies() {
        let catalog_svc = catalog_service(&LogPublisher::new());
        catalog_svc.sync_book("9780441013593").await.expect("should sync book");
        let book = catalog_svc.add_copies("9780441013593", 3).await.expect("should add copies");
        assert_eq!(3, book.total_copies);
        assert_eq!(3, book.available_copies);
        assert_eq!(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_time(NaiveTime::MIN), book.updated_at);
        assert!(matches!(catalog_svc.add_copies("9780441013593", 0).await, Err(LibraryError::Validation { .. })));
        assert!(matches!(catalog_svc.add_copies("missing", 1).await, Err(LibraryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_should_search_available_books() {
        let catalog_svc = catalog_service(&LogPublisher::new());
        catalog_svc.sync_book("9780441013593").await.expect("should sync book");
        catalog_svc.sync_book("9780441172719").await.expect("should sync book");
        assert!(catalog_svc.search_available("dune").await.expect("should search").is_empty());

        catalog_svc.add_copies("9780441172719", 1).await.expect("should add copies");
        let found = catalog_svc.search_available("DUNE").await.expect("should search");
        assert_eq!(1, found.len());
        assert_eq!("Dune Messiah", found[0].title.as_str());
        assert_eq!(1, catalog_svc.search_available("172719").await.expect("should search").len());
    }
}
