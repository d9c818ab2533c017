pub mod model;
pub mod service;

use async_trait::async_trait;
use crate::core::library::LibraryResult;
use crate::patrons::dto::{PatronDto, PatronSummary};

#[async_trait]
pub trait PatronService: Sync + Send {
    async fn register_patron(&self, first_name: &str, last_name: &str, email: &str) -> LibraryResult<PatronDto>;
    async fn find_patron_by_id(&self, patron_id: i64) -> LibraryResult<PatronSummary>;
    async fn find_patron_by_email(&self, email: &str) -> LibraryResult<PatronSummary>;
}
