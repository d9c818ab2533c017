pub mod ddb_fine_repository;
pub mod memory_fine_repository;

use async_trait::async_trait;
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;
use crate::fines::domain::model::FineEntity;

#[async_trait]
pub trait FineRepository: Repository<FineEntity> {
    async fn fines_for_loan(&self, loan_id: &str) -> LibraryResult<Vec<FineEntity>>;

    async fn fines_for_patron(&self, patron_id: i64) -> LibraryResult<Vec<FineEntity>>;
}
