pub mod fetcher;
pub mod model;
pub mod service;

use async_trait::async_trait;
use crate::books::dto::BookDto;
use crate::core::library::LibraryResult;

#[async_trait]
pub trait CatalogService: Sync + Send {
    // returns the catalog entry for isbn, creating it from upstream metadata when missing
    async fn sync_book(&self, isbn: &str) -> LibraryResult<BookDto>;
    async fn find_book(&self, isbn: &str) -> LibraryResult<BookDto>;
    async fn add_copies(&self, isbn: &str, count: i64) -> LibraryResult<BookDto>;
    async fn search_available(&self, term: &str) -> LibraryResult<Vec<BookDto>>;
}
