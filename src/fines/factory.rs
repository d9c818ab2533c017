use crate::core::repository::StoreHandle;
use crate::fines::repository::FineRepository;
use crate::fines::repository::ddb_fine_repository::DDBFineRepository;
use crate::fines::repository::memory_fine_repository::MemoryFineRepository;
use crate::utils::ddb::{index_name, FINES_TABLE};

pub fn create_fine_repository(handle: &StoreHandle) -> Box<dyn FineRepository> {
    match handle {
        StoreHandle::DynamoDB { client, .. } => {
            Box::new(DDBFineRepository::new(client.clone(), FINES_TABLE, index_name(FINES_TABLE).as_str()))
        }
        StoreHandle::Memory(db) => {
            Box::new(MemoryFineRepository::new(db.clone()))
        }
    }
}
