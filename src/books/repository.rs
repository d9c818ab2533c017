pub mod ddb_book_repository;
pub mod memory_book_repository;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use crate::books::domain::model::BookEntity;
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;

pub const MAX_SEARCH_RESULTS: usize = 20;

#[async_trait]
pub trait BookRepository: Repository<BookEntity> {
    // adds copies to both counters under the book's row lock (or version check)
    async fn add_copies(&self, isbn: &str, count: i64, now: NaiveDateTime) -> LibraryResult<BookEntity>;

    // books with copies on the shelf whose isbn or title contains the term
    async fn search_available(&self, term: &str, limit: usize) -> LibraryResult<Vec<BookEntity>>;
}
