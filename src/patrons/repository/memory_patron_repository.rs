use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::patrons::domain::model::PatronEntity;
use crate::patrons::normalize_email;
use crate::patrons::repository::PatronRepository;
use crate::utils::ddb::PATRONS_TABLE;
use crate::utils::memory::{paginate, MemoryDatabase};

#[derive(Debug)]
pub struct MemoryPatronRepository {
    db: Arc<MemoryDatabase>,
}

impl MemoryPatronRepository {
    pub(crate) fn new(db: Arc<MemoryDatabase>) -> Self {
        Self {
            db,
        }
    }

    fn scan_email(&self, email: &str) -> LibraryResult<Vec<PatronEntity>> {
        self.db.scan(PATRONS_TABLE, &HashMap::from([("email".to_string(), normalize_email(email))]))
    }
}

#[async_trait]
impl Repository<PatronEntity> for MemoryPatronRepository {
    async fn create(&self, entity: &PatronEntity) -> LibraryResult<usize> {
        // registrations of one email are serialized on the email
        let _guard = self.db.lock_row(PATRONS_TABLE, format!("email#{}", entity.email).as_str()).await;
        if !self.scan_email(entity.email.as_str())?.is_empty() {
            return Err(LibraryError::duplicate_key(
                format!("patron with email {} already exists", entity.email).as_str()));
        }
        self.db.insert(PATRONS_TABLE, entity.patron_id.to_string().as_str(), entity).map(|_| 1)
    }

    async fn get(&self, id: &str) -> LibraryResult<PatronEntity> {
        self.db.get(PATRONS_TABLE, id)?.ok_or_else(||
            LibraryError::not_found(format!("patron not found for {}", id).as_str()))
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<PatronEntity>> {
        let records = self.db.scan(PATRONS_TABLE, predicate)?;
        Ok(paginate(records, page, page_size))
    }
}

#[async_trait]
impl PatronRepository for MemoryPatronRepository {
    async fn next_id(&self) -> LibraryResult<i64> {
        Ok(self.db.next_sequence(PATRONS_TABLE))
    }

    async fn find_by_email(&self, email: &str) -> LibraryResult<Option<PatronEntity>> {
        Ok(self.scan_email(email)?.into_iter().next())
    }
}
