use std::sync::Arc;
use crate::books::factory::create_book_repository;
use crate::checkout::domain::CirculationService;
use crate::checkout::domain::service::CirculationServiceImpl;
use crate::checkout::repository::{CirculationStore, LoanRepository};
use crate::checkout::repository::ddb_circulation_store::DDBCirculationStore;
use crate::checkout::repository::ddb_loan_repository::DDBLoanRepository;
use crate::checkout::repository::memory_circulation_store::MemoryCirculationStore;
use crate::checkout::repository::memory_loan_repository::MemoryLoanRepository;
use crate::core::domain::Configuration;
use crate::core::repository::StoreHandle;
use crate::fines::factory::create_fine_repository;
use crate::gateway::factory::create_publisher;
use crate::utils::date::{Clock, SystemClock};
use crate::utils::ddb::{index_name, BOOKS_TABLE, FINES_TABLE, LOANS_TABLE};

pub fn create_circulation_store(handle: &StoreHandle) -> Box<dyn CirculationStore> {
    match handle {
        StoreHandle::DynamoDB { client, .. } => {
            Box::new(DDBCirculationStore::new(client.clone(), BOOKS_TABLE, LOANS_TABLE,
                                              index_name(LOANS_TABLE).as_str(), FINES_TABLE))
        }
        StoreHandle::Memory(db) => {
            Box::new(MemoryCirculationStore::new(db.clone()))
        }
    }
}

pub fn create_loan_repository(handle: &StoreHandle) -> Box<dyn LoanRepository> {
    match handle {
        StoreHandle::DynamoDB { client, .. } => {
            Box::new(DDBLoanRepository::new(client.clone(), LOANS_TABLE, index_name(LOANS_TABLE).as_str()))
        }
        StoreHandle::Memory(db) => {
            Box::new(MemoryLoanRepository::new(db.clone()))
        }
    }
}

pub async fn create_circulation_service(config: &Configuration, handle: &StoreHandle) -> Box<dyn CirculationService> {
    create_circulation_service_with_clock(config, handle, Arc::new(SystemClock)).await
}

pub async fn create_circulation_service_with_clock(config: &Configuration, handle: &StoreHandle,
                                                   clock: Arc<dyn Clock>) -> Box<dyn CirculationService> {
    let publisher = create_publisher(config, handle).await;
    Box::new(CirculationServiceImpl::new(config,
                                         create_circulation_store(handle),
                                         create_loan_repository(handle),
                                         create_fine_repository(handle),
                                         create_book_repository(handle),
                                         publisher,
                                         clock))
}
