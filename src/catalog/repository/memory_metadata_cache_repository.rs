use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use crate::catalog::domain::model::MetadataCacheEntity;
use crate::catalog::repository::MetadataCacheRepository;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::ddb::METADATA_CACHE_TABLE;
use crate::utils::memory::{paginate, MemoryDatabase};

#[derive(Debug)]
pub struct MemoryMetadataCacheRepository {
    db: Arc<MemoryDatabase>,
}

impl MemoryMetadataCacheRepository {
    pub(crate) fn new(db: Arc<MemoryDatabase>) -> Self {
        Self {
            db,
        }
    }
}

#[async_trait]
impl Repository<MetadataCacheEntity> for MemoryMetadataCacheRepository {
    async fn create(&self, entity: &MetadataCacheEntity) -> LibraryResult<usize> {
        self.db.insert(METADATA_CACHE_TABLE, entity.isbn.as_str(), entity).map(|_| 1)
    }

    async fn get(&self, id: &str) -> LibraryResult<MetadataCacheEntity> {
        self.db.get(METADATA_CACHE_TABLE, id)?.ok_or_else(||
            LibraryError::not_found(format!("no cached metadata for {}", id).as_str()))
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<MetadataCacheEntity>> {
        let records = self.db.scan(METADATA_CACHE_TABLE, predicate)?;
        Ok(paginate(records, page, page_size))
    }
}

#[async_trait]
impl MetadataCacheRepository for MemoryMetadataCacheRepository {
    async fn upsert(&self, entry: &MetadataCacheEntity) -> LibraryResult<()> {
        self.db.put(METADATA_CACHE_TABLE, entry.isbn.as_str(), entry)
    }
}
