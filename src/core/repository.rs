use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use serde::{Deserialize, Serialize};
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::gateway::GatewayPublisherVia;
use crate::utils::ddb::{build_db_client, create_tables};
use crate::utils::memory::MemoryDatabase;

#[async_trait]
pub trait Repository<Entity>: Sync + Send {
    // create an entity, failing with duplicate-key when it already exists
    async fn create(&self, entity: &Entity) -> LibraryResult<usize>;

    // get an entity
    async fn get(&self, id: &str) -> LibraryResult<Entity>;

    // find by attribute equality (or `attr:op` comparisons)
    async fn query(&self, predicate: &HashMap::<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<Entity>>;
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy)]
pub enum RepositoryStore {
    DynamoDB,
    LocalDynamoDB,
    Memory,
}

impl RepositoryStore {
    pub fn gateway_publisher(&self) -> GatewayPublisherVia {
        match self {
            RepositoryStore::DynamoDB => { GatewayPublisherVia::Sns }
            RepositoryStore::LocalDynamoDB => { GatewayPublisherVia::LocalDynamoDB }
            RepositoryStore::Memory => { GatewayPublisherVia::Log }
        }
    }
}

// StoreHandle is the connected store shared by every repository of a process. It is
// built once at startup and passed into the factories.
#[derive(Clone)]
pub enum StoreHandle {
    DynamoDB {
        store: RepositoryStore,
        client: Client,
    },
    Memory(Arc<MemoryDatabase>),
}

impl StoreHandle {
    pub async fn connect(store: RepositoryStore) -> LibraryResult<StoreHandle> {
        match store {
            RepositoryStore::DynamoDB => {
                let client = build_db_client(store).await;
                Ok(StoreHandle::DynamoDB { store, client })
            }
            RepositoryStore::LocalDynamoDB => {
                let client = build_db_client(store).await;
                create_tables(&client).await?;
                Ok(StoreHandle::DynamoDB { store, client })
            }
            RepositoryStore::Memory => {
                Ok(StoreHandle::memory())
            }
        }
    }

    pub fn memory() -> StoreHandle {
        StoreHandle::Memory(Arc::new(MemoryDatabase::new()))
    }

    pub fn store(&self) -> RepositoryStore {
        match self {
            StoreHandle::DynamoDB { store, .. } => { *store }
            StoreHandle::Memory(_) => { RepositoryStore::Memory }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::repository::{RepositoryStore, StoreHandle};
    use crate::gateway::GatewayPublisherVia;

    #[tokio::test]
    async fn test_should_connect_memory_store() {
        let handle = StoreHandle::connect(RepositoryStore::Memory).await.expect("should connect");
        assert_eq!(RepositoryStore::Memory, handle.store());
        assert_eq!(GatewayPublisherVia::Log, handle.store().gateway_publisher());
    }

    #[tokio::test]
    async fn test_should_pick_publisher_per_store() {
        assert_eq!(GatewayPublisherVia::Sns, RepositoryStore::DynamoDB.gateway_publisher());
        assert_eq!(GatewayPublisherVia::LocalDynamoDB, RepositoryStore::LocalDynamoDB.gateway_publisher());
    }
}
