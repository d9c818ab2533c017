use std::path::Path;
use std::sync::Arc;
use tracing::warn;
use crate::books::factory::create_book_repository;
use crate::catalog::domain::CatalogService;
use crate::catalog::domain::fetcher::{CachedMetadataFetcher, MetadataFetcher, StaticMetadataFetcher};
use crate::catalog::domain::service::CatalogServiceImpl;
use crate::catalog::repository::MetadataCacheRepository;
use crate::catalog::repository::ddb_metadata_cache_repository::DDBMetadataCacheRepository;
use crate::catalog::repository::memory_metadata_cache_repository::MemoryMetadataCacheRepository;
use crate::core::domain::Configuration;
use crate::core::repository::StoreHandle;
use crate::gateway::factory::create_publisher;
use crate::utils::date::{Clock, SystemClock};
use crate::utils::ddb::METADATA_CACHE_TABLE;

pub fn create_metadata_cache_repository(handle: &StoreHandle) -> Box<dyn MetadataCacheRepository> {
    match handle {
        StoreHandle::DynamoDB { client, .. } => {
            Box::new(DDBMetadataCacheRepository::new(client.clone(), METADATA_CACHE_TABLE))
        }
        StoreHandle::Memory(db) => {
            Box::new(MemoryMetadataCacheRepository::new(db.clone()))
        }
    }
}

// upstream volumes come from the configured seed file; without one every isbn is unknown
pub fn create_upstream_fetcher(config: &Configuration) -> Box<dyn MetadataFetcher> {
    match config.catalog_seed_path.as_deref() {
        Some(path) => {
            match StaticMetadataFetcher::from_file(Path::new(path)) {
                Ok(fetcher) => Box::new(fetcher),
                Err(err) => {
                    warn!("failed to load catalog seed {}: {}", path, err);
                    Box::new(StaticMetadataFetcher::new())
                }
            }
        }
        None => Box::new(StaticMetadataFetcher::new()),
    }
}

pub async fn create_catalog_service(config: &Configuration, handle: &StoreHandle) -> Box<dyn CatalogService> {
    create_catalog_service_with(config, handle, create_upstream_fetcher(config), Arc::new(SystemClock)).await
}

pub async fn create_catalog_service_with(config: &Configuration, handle: &StoreHandle,
                                         upstream: Box<dyn MetadataFetcher>,
                                         clock: Arc<dyn Clock>) -> Box<dyn CatalogService> {
    let fetcher = CachedMetadataFetcher::new(upstream, create_metadata_cache_repository(handle),
                                             config.cache_freshness_days, clock.clone());
    let publisher = create_publisher(config, handle).await;
    Box::new(CatalogServiceImpl::new(config, create_book_repository(handle),
                                     Box::new(fetcher), publisher, clock))
}
