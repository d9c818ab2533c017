pub mod ddb_patron_repository;
pub mod memory_patron_repository;

use async_trait::async_trait;
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;
use crate::patrons::domain::model::PatronEntity;

#[async_trait]
pub trait PatronRepository: Repository<PatronEntity> {
    // allocates the next patron id, starting at 1
    async fn next_id(&self) -> LibraryResult<i64>;

    async fn find_by_email(&self, email: &str) -> LibraryResult<Option<PatronEntity>>;
}
