use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;
use crate::books::domain::model::BookEntity;
use crate::checkout::domain::model::{earliest_open, LoanEntity};
use crate::checkout::repository::{CirculationStore, CirculationTransaction};
use crate::core::library::{LibraryError, LibraryResult};
use crate::fines::domain::model::FineEntity;
use crate::utils::ddb::{BOOKS_TABLE, FINES_TABLE, LOANS_TABLE};
use crate::utils::memory::{row_lock_key, MemoryDatabase, MemoryWrite};

#[derive(Debug)]
pub struct MemoryCirculationStore {
    db: Arc<MemoryDatabase>,
}

impl MemoryCirculationStore {
    pub(crate) fn new(db: Arc<MemoryDatabase>) -> Self {
        Self {
            db,
        }
    }
}

#[async_trait]
impl CirculationStore for MemoryCirculationStore {
    async fn begin(&self) -> LibraryResult<Box<dyn CirculationTransaction>> {
        Ok(Box::new(MemoryCirculationTransaction {
            db: self.db.clone(),
            guards: HashMap::new(),
            writes: vec![],
        }))
    }
}

// Row locks are held from first touch until commit or drop, which gives the same
// isolation as SELECT ... FOR UPDATE. Writes only reach the database at commit.
pub struct MemoryCirculationTransaction {
    db: Arc<MemoryDatabase>,
    guards: HashMap<String, OwnedMutexGuard<()>>,
    writes: Vec<MemoryWrite>,
}

impl MemoryCirculationTransaction {
    async fn lock(&mut self, table: &str, key: &str) {
        let lock_key = row_lock_key(table, key);
        if !self.guards.contains_key(&lock_key) {
            let guard = self.db.lock_row(table, key).await;
            self.guards.insert(lock_key, guard);
        }
    }

    // last staged version of every row of a table
    fn staged_rows(&self, table_name: &str) -> HashMap<String, Option<Value>> {
        let mut rows = HashMap::new();
        for write in &self.writes {
            match write {
                MemoryWrite::Insert { table, key, row } | MemoryWrite::Put { table, key, row } if table == table_name => {
                    rows.insert(key.clone(), Some(row.clone()));
                }
                MemoryWrite::Delete { table, key } if table == table_name => {
                    rows.insert(key.clone(), None);
                }
                _ => {}
            }
        }
        rows
    }

    fn loans(&self) -> LibraryResult<Vec<LoanEntity>> {
        let mut rows: HashMap<String, Value> = self.db.scan_rows(LOANS_TABLE).into_iter().collect();
        for (key, row) in self.staged_rows(LOANS_TABLE) {
            match row {
                Some(row) => { rows.insert(key, row); }
                None => { rows.remove(&key); }
            }
        }
        rows.into_values()
            .map(|row| serde_json::from_value(row).map_err(LibraryError::from))
            .collect()
    }
}

#[async_trait]
impl CirculationTransaction for MemoryCirculationTransaction {
    async fn lock_book(&mut self, isbn: &str) -> LibraryResult<Option<BookEntity>> {
        self.lock(BOOKS_TABLE, isbn).await;
        if let Some(staged) = self.staged_rows(BOOKS_TABLE).remove(isbn) {
            return match staged {
                Some(row) => Ok(Some(serde_json::from_value(row)?)),
                None => Ok(None),
            };
        }
        self.db.get(BOOKS_TABLE, isbn)
    }

    async fn lock_open_loan(&mut self, isbn: &str, patron_id: i64) -> LibraryResult<Option<LoanEntity>> {
        self.lock(LOANS_TABLE, format!("open#{}#{}", isbn, patron_id).as_str()).await;
        let loans = self.loans()?.into_iter()
            .filter(|l| l.isbn == isbn && l.patron_id == patron_id)
            .collect();
        Ok(earliest_open(loans))
    }

    async fn active_loans(&mut self, patron_id: i64) -> LibraryResult<Vec<LoanEntity>> {
        let mut loans: Vec<LoanEntity> = self.loans()?.into_iter()
            .filter(|l| l.patron_id == patron_id && l.is_open())
            .collect();
        loans.sort_by(|a, b| a.checkout_date.cmp(&b.checkout_date).then_with(|| a.loan_id.cmp(&b.loan_id)));
        Ok(loans)
    }

    async fn update_book(&mut self, book: &BookEntity) -> LibraryResult<()> {
        let lock_key = row_lock_key(BOOKS_TABLE, book.isbn.as_str());
        if !self.guards.contains_key(&lock_key) {
            return Err(LibraryError::runtime(
                format!("book {} must be locked before it is updated", book.isbn).as_str(), None));
        }
        let mut next = book.clone();
        next.version += 1;
        self.writes.push(MemoryWrite::put(BOOKS_TABLE, book.isbn.as_str(), &next)?);
        Ok(())
    }

    async fn insert_loan(&mut self, loan: &LoanEntity) -> LibraryResult<()> {
        self.writes.push(MemoryWrite::insert(LOANS_TABLE, loan.loan_id.as_str(), loan)?);
        Ok(())
    }

    async fn close_loan(&mut self, loan: &LoanEntity) -> LibraryResult<()> {
        let mut next = loan.clone();
        next.version += 1;
        self.writes.push(MemoryWrite::put(LOANS_TABLE, loan.loan_id.as_str(), &next)?);
        Ok(())
    }

    async fn insert_fine(&mut self, fine: &FineEntity) -> LibraryResult<()> {
        self.writes.push(MemoryWrite::insert(FINES_TABLE, fine.fine_id.as_str(), fine)?);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> LibraryResult<()> {
        let MemoryCirculationTransaction { db, guards, writes } = *self;
        debug!("committing {} writes under {} row locks", writes.len(), guards.len());
        let res = db.apply(writes);
        drop(guards);
        res
    }

    async fn rollback(self: Box<Self>) {
        debug!("rolling back {} staged writes", self.writes.len());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use chrono::Utc;
    use crate::books::domain::model::BookEntity;
    use crate::checkout::domain::model::LoanEntity;
    use crate::checkout::repository::CirculationStore;
    use crate::checkout::repository::memory_circulation_store::MemoryCirculationStore;
    use crate::utils::ddb::{BOOKS_TABLE, LOANS_TABLE};
    use crate::utils::memory::MemoryDatabase;

    fn seed_book(db: &MemoryDatabase) -> BookEntity {
        let now = Utc::now().naive_utc();
        let mut book = BookEntity::new("isbn", "title", None, None, vec!["author".to_string()], now);
        book.add_copies(2, now).expect("should add copies");
        db.insert(BOOKS_TABLE, "isbn", &book).expect("should insert book");
        book
    }

    #[tokio::test]
    async fn test_should_apply_writes_only_on_commit() {
        let db = Arc::new(MemoryDatabase::new());
        seed_book(&db);
        let store = MemoryCirculationStore::new(db.clone());
        let now = Utc::now().naive_utc();

        let mut tx = store.begin().await.expect("should begin");
        let mut book = tx.lock_book("isbn").await.expect("should lock").expect("should exist");
        book.take_copy(now).expect("should take copy");
        tx.update_book(&book).await.expect("should stage book");
        let loan = LoanEntity::new("main", "isbn", 1, now.date(), 14, now);
        tx.insert_loan(&loan).await.expect("should stage loan");
        // the transaction sees its own loan
        assert_eq!(1, tx.active_loans(1).await.expect("should list").len());
        assert_eq!(Some(loan.clone()), tx.lock_open_loan("isbn", 1).await.expect("should lock loan"));
        tx.rollback().await;

        let stored: BookEntity = db.get(BOOKS_TABLE, "isbn").expect("should read").expect("should exist");
        assert_eq!(2, stored.available_copies);
        let stored_loan: Option<LoanEntity> = db.get(LOANS_TABLE, loan.loan_id.as_str()).expect("should read");
        assert!(stored_loan.is_none());

        let mut tx = store.begin().await.expect("should begin");
        let book = tx.lock_book("isbn").await.expect("should lock").expect("should exist");
        tx.update_book(&book).await.expect("should stage book");
        tx.insert_loan(&loan).await.expect("should stage loan");
        tx.commit().await.expect("should commit");
        let stored: BookEntity = db.get(BOOKS_TABLE, "isbn").expect("should read").expect("should exist");
        assert_eq!(book.version + 1, stored.version);
        let stored_loan: Option<LoanEntity> = db.get(LOANS_TABLE, loan.loan_id.as_str()).expect("should read");
        assert_eq!(Some(loan), stored_loan);
    }

    #[tokio::test]
    async fn test_should_block_second_transaction_on_same_book() {
        let db = Arc::new(MemoryDatabase::new());
        seed_book(&db);
        let store = Arc::new(MemoryCirculationStore::new(db.clone()));
        let mut tx = store.begin().await.expect("should begin");
        let _ = tx.lock_book("isbn").await.expect("should lock");

        let other = store.clone();
        let waiter = tokio::spawn(async move {
            let mut tx = other.begin().await.expect("should begin");
            let book = tx.lock_book("isbn").await.expect("should lock");
            tx.rollback().await;
            book
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        tx.rollback().await;
        let book = waiter.await.expect("should join");
        assert!(book.is_some());
    }

    #[tokio::test]
    async fn test_should_reject_update_without_lock() {
        let db = Arc::new(MemoryDatabase::new());
        let book = seed_book(&db);
        let store = MemoryCirculationStore::new(db);
        let mut tx = store.begin().await.expect("should begin");
        assert!(tx.update_book(&book).await.is_err());
    }
}
