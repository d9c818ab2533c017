use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use crate::books::domain::Book;
use crate::books::domain::model::BookEntity;
use crate::books::repository::BookRepository;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::ddb::BOOKS_TABLE;
use crate::utils::memory::{paginate, MemoryDatabase};

#[derive(Debug)]
pub struct MemoryBookRepository {
    db: Arc<MemoryDatabase>,
}

impl MemoryBookRepository {
    pub(crate) fn new(db: Arc<MemoryDatabase>) -> Self {
        Self {
            db,
        }
    }
}

#[async_trait]
impl Repository<BookEntity> for MemoryBookRepository {
    async fn create(&self, entity: &BookEntity) -> LibraryResult<usize> {
        self.db.insert(BOOKS_TABLE, entity.isbn.as_str(), entity).map(|_| 1)
    }

    async fn get(&self, id: &str) -> LibraryResult<BookEntity> {
        self.db.get(BOOKS_TABLE, id)?.ok_or_else(||
            LibraryError::not_found(format!("book not found for {}", id).as_str()))
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        let records = self.db.scan(BOOKS_TABLE, predicate)?;
        Ok(paginate(records, page, page_size))
    }
}

#[async_trait]
impl BookRepository for MemoryBookRepository {
    async fn add_copies(&self, isbn: &str, count: i64, now: NaiveDateTime) -> LibraryResult<BookEntity> {
        let _guard = self.db.lock_row(BOOKS_TABLE, isbn).await;
        let mut book = self.get(isbn).await?;
        book.add_copies(count, now)?;
        book.version += 1;
        self.db.put(BOOKS_TABLE, isbn, &book)?;
        Ok(book)
    }

    async fn search_available(&self, term: &str, limit: usize) -> LibraryResult<Vec<BookEntity>> {
        let books: Vec<BookEntity> = self.db.scan(BOOKS_TABLE, &HashMap::new())?;
        Ok(books.into_iter()
            .filter(|b| b.is_available() && b.matches_term(term))
            .take(limit)
            .collect())
    }
}
