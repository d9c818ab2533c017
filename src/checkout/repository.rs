pub mod ddb_circulation_store;
pub mod ddb_loan_repository;
pub mod memory_circulation_store;
pub mod memory_loan_repository;

use async_trait::async_trait;
use chrono::NaiveDate;
use crate::books::domain::model::BookEntity;
use crate::checkout::domain::model::LoanEntity;
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::fines::domain::model::FineEntity;

#[async_trait]
pub trait LoanRepository: Repository<LoanEntity> {
    // open loans of a patron, oldest checkout first
    async fn find_open_loans(&self, patron_id: i64) -> LibraryResult<Vec<LoanEntity>>;

    // every loan, open or closed, of an isbn
    async fn find_by_isbn(&self, isbn: &str) -> LibraryResult<Vec<LoanEntity>>;

    // open loans whose due date is before today
    async fn query_overdue(&self, today: NaiveDate,
                           page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanEntity>>;
}

// CirculationStore hands out units of work spanning books, loans and fines.
#[async_trait]
pub trait CirculationStore: Sync + Send {
    async fn begin(&self) -> LibraryResult<Box<dyn CirculationTransaction>>;
}

// CirculationTransaction stages writes until commit; dropping it without commit
// discards them. Rows must be locked book first, then loan.
#[async_trait]
pub trait CirculationTransaction: Send {
    // locks the book row and returns it, None when the isbn is unknown
    async fn lock_book(&mut self, isbn: &str) -> LibraryResult<Option<BookEntity>>;

    // locks the open loan of the pair, picking the earliest checkout when several exist
    async fn lock_open_loan(&mut self, isbn: &str, patron_id: i64) -> LibraryResult<Option<LoanEntity>>;

    // open loans of the patron including the ones staged by this transaction
    async fn active_loans(&mut self, patron_id: i64) -> LibraryResult<Vec<LoanEntity>>;

    // stages the book as locked; the stored version is bumped on commit
    async fn update_book(&mut self, book: &BookEntity) -> LibraryResult<()>;

    async fn insert_loan(&mut self, loan: &LoanEntity) -> LibraryResult<()>;

    async fn close_loan(&mut self, loan: &LoanEntity) -> LibraryResult<()>;

    async fn insert_fine(&mut self, fine: &FineEntity) -> LibraryResult<()>;

    async fn commit(self: Box<Self>) -> LibraryResult<()>;

    async fn rollback(self: Box<Self>);
}
