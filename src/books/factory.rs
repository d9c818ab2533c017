use crate::books::repository::BookRepository;
use crate::books::repository::ddb_book_repository::DDBBookRepository;
use crate::books::repository::memory_book_repository::MemoryBookRepository;
use crate::core::repository::StoreHandle;
use crate::utils::ddb::BOOKS_TABLE;

pub fn create_book_repository(handle: &StoreHandle) -> Box<dyn BookRepository> {
    match handle {
        StoreHandle::DynamoDB { client, .. } => {
            Box::new(DDBBookRepository::new(client.clone(), BOOKS_TABLE))
        }
        StoreHandle::Memory(db) => {
            Box::new(MemoryBookRepository::new(db.clone()))
        }
    }
}
