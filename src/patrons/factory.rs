use std::sync::Arc;
use crate::checkout::factory::create_loan_repository;
use crate::core::domain::Configuration;
use crate::core::repository::StoreHandle;
use crate::gateway::factory::create_publisher;
use crate::patrons::domain::PatronService;
use crate::patrons::domain::service::PatronServiceImpl;
use crate::patrons::repository::PatronRepository;
use crate::patrons::repository::ddb_patron_repository::DDBPatronRepository;
use crate::patrons::repository::memory_patron_repository::MemoryPatronRepository;
use crate::utils::date::SystemClock;
use crate::utils::ddb::PATRONS_TABLE;

pub fn create_patron_repository(handle: &StoreHandle) -> Box<dyn PatronRepository> {
    match handle {
        StoreHandle::DynamoDB { client, .. } => {
            Box::new(DDBPatronRepository::new(client.clone(), PATRONS_TABLE))
        }
        StoreHandle::Memory(db) => {
            Box::new(MemoryPatronRepository::new(db.clone()))
        }
    }
}

pub async fn create_patron_service(config: &Configuration, handle: &StoreHandle) -> Box<dyn PatronService> {
    let publisher = create_publisher(config, handle).await;
    Box::new(PatronServiceImpl::new(config, create_patron_repository(handle),
                                    create_loan_repository(handle), publisher, Arc::new(SystemClock)))
}
