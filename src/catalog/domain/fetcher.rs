use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};
use crate::catalog::domain::model::{BookMetadata, MetadataCacheEntity};
use crate::catalog::repository::MetadataCacheRepository;
use crate::core::library::{LibraryError, LibraryResult};
use crate::utils::date::Clock;

// MetadataFetcher resolves an isbn against an upstream catalog
#[async_trait]
pub trait MetadataFetcher: Sync + Send {
    async fn fetch_metadata(&self, isbn: &str) -> LibraryResult<BookMetadata>;
}

/// StaticMetadataFetcher answers from a fixed set of volumes, typically loaded from a
/// JSON seed file that maps each isbn to a volume in the Google Books layout.
#[derive(Debug, Default)]
pub struct StaticMetadataFetcher {
    volumes: HashMap<String, Value>,
}

impl StaticMetadataFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_volume(mut self, isbn: &str, volume: Value) -> Self {
        self.volumes.insert(isbn.to_string(), volume);
        self
    }

    pub fn from_file(path: &Path) -> LibraryResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let volumes: HashMap<String, Value> = serde_json::from_str(json.as_str())?;
        info!("loaded {} catalog volumes from {}", volumes.len(), path.display());
        Ok(Self { volumes })
    }
}

#[async_trait]
impl MetadataFetcher for StaticMetadataFetcher {
    async fn fetch_metadata(&self, isbn: &str) -> LibraryResult<BookMetadata> {
        match self.volumes.get(isbn) {
            Some(volume) => Ok(BookMetadata::from_volume(isbn, volume)),
            None => Err(LibraryError::not_found(format!("no upstream metadata for {}", isbn).as_str())),
        }
    }
}

// CachedMetadataFetcher serves fresh cache entries and refreshes stale or missing
// ones from upstream.
pub struct CachedMetadataFetcher {
    upstream: Box<dyn MetadataFetcher>,
    cache: Box<dyn MetadataCacheRepository>,
    freshness_days: i64,
    clock: Arc<dyn Clock>,
}

impl CachedMetadataFetcher {
    pub(crate) fn new(upstream: Box<dyn MetadataFetcher>, cache: Box<dyn MetadataCacheRepository>,
                      freshness_days: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            upstream,
            cache,
            freshness_days,
            clock,
        }
    }
}

#[async_trait]
impl MetadataFetcher for CachedMetadataFetcher {
    async fn fetch_metadata(&self, isbn: &str) -> LibraryResult<BookMetadata> {
        let now = self.clock.now();
        match self.cache.get(isbn).await {
            Ok(entry) if entry.is_fresh(now, self.freshness_days) => {
                debug!("metadata cache hit for {}", isbn);
                return Ok(entry.metadata);
            }
            Ok(_) => {
                debug!("metadata cache entry for {} is stale", isbn);
            }
            Err(LibraryError::NotFound { .. }) => {}
            Err(err) => {
                warn!("metadata cache lookup for {} failed, asking upstream: {}", isbn, err);
            }
        }
        let metadata = self.upstream.fetch_metadata(isbn).await?;
        if let Err(err) = self.cache.upsert(&MetadataCacheEntity::new(&metadata, now)).await {
            warn!("failed to cache metadata for {}: {}", isbn, err);
        }
        Ok(metadata)
    }
}
