use async_trait::async_trait;
use crate::checkout::dto::{ActiveLoanDto, LoanDto, ReturnReceipt};
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::fines::dto::FineDto;

pub mod model;
pub mod service;

#[async_trait]
pub trait CirculationService: Sync + Send {
    // lends one copy of isbn to the patron
    async fn checkout(&self, isbn: &str, patron_id: i64) -> LibraryResult<LoanDto>;

    // closes the patron's open loan for isbn, assessing a fine when it is overdue
    async fn returned(&self, isbn: &str, patron_id: i64) -> LibraryResult<ReturnReceipt>;

    async fn active_loans_for(&self, patron_id: i64) -> LibraryResult<Vec<ActiveLoanDto>>;

    async fn active_loan_count(&self, patron_id: i64) -> LibraryResult<usize>;

    async fn loans_for_isbn(&self, isbn: &str) -> LibraryResult<Vec<LoanDto>>;

    async fn overdue_loans(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>>;

    async fn fines_for_patron(&self, patron_id: i64) -> LibraryResult<Vec<FineDto>>;

    async fn fines_for_loan(&self, loan_id: &str) -> LibraryResult<Vec<FineDto>>;
}
