pub mod ddb_metadata_cache_repository;
pub mod memory_metadata_cache_repository;

use async_trait::async_trait;
use crate::catalog::domain::model::MetadataCacheEntity;
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;

#[async_trait]
pub trait MetadataCacheRepository: Repository<MetadataCacheEntity> {
    // inserts or replaces the cached metadata of an isbn
    async fn upsert(&self, entry: &MetadataCacheEntity) -> LibraryResult<()>;
}
