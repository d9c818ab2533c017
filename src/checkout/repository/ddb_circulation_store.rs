use std::collections::{HashMap, HashSet};
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, TransactWriteItem};
use tracing::debug;
use crate::books::domain::model::BookEntity;
use crate::checkout::domain::model::{earliest_open, LoanEntity};
use crate::checkout::repository::{CirculationStore, CirculationTransaction};
use crate::core::library::{LibraryError, LibraryResult, LoanStatus};
use crate::fines::domain::model::FineEntity;
use crate::utils::ddb::{parse_entity, parse_string_attribute, to_item};

// Open loans are guarded by a marker item in the loans table keyed by isbn and patron,
// so two transactions opening the same loan cannot both commit.
pub(crate) fn open_loan_marker(isbn: &str, patron_id: i64) -> String {
    format!("open#{}#{}", isbn, patron_id)
}

pub(crate) fn patron_key(patron_id: i64) -> AttributeValue {
    AttributeValue::S(patron_id.to_string())
}

pub(crate) const OPEN_LOANS_PAGE_SIZE: i32 = 500;

// open loans of a patron in checkout_date order, following LastEvaluatedKey past the 1MB page
pub(crate) async fn query_open_loans(client: &Client, table_name: &str, index_name: &str,
                                     patron_id: i64, page_size: i32) -> LibraryResult<Vec<LoanEntity>> {
    let mut loans = vec![];
    let mut start_key: Option<HashMap<String, AttributeValue>> = None;
    loop {
        let res = client
            .query()
            .table_name(table_name)
            .index_name(index_name)
            .key_condition_expression("patron_key = :patron_key")
            .filter_expression("loan_status = :loan_status")
            .expression_attribute_values(":patron_key", patron_key(patron_id))
            .expression_attribute_values(":loan_status", AttributeValue::S(LoanStatus::Open.to_string()))
            .set_exclusive_start_key(start_key)
            .limit(page_size)
            .send()
            .await?;
        for item in res.items().unwrap_or_default() {
            loans.push(parse_entity(item)?);
        }
        start_key = res.last_evaluated_key().cloned();
        if start_key.is_none() {
            break;
        }
    }
    Ok(loans)
}

#[derive(Debug)]
pub struct DDBCirculationStore {
    client: Client,
    books_table: String,
    loans_table: String,
    loans_index: String,
    fines_table: String,
}

impl DDBCirculationStore {
    pub(crate) fn new(client: Client, books_table: &str, loans_table: &str,
                      loans_index: &str, fines_table: &str) -> Self {
        Self {
            client,
            books_table: books_table.to_string(),
            loans_table: loans_table.to_string(),
            loans_index: loans_index.to_string(),
            fines_table: fines_table.to_string(),
        }
    }
}

#[async_trait]
impl CirculationStore for DDBCirculationStore {
    async fn begin(&self) -> LibraryResult<Box<dyn CirculationTransaction>> {
        Ok(Box::new(DDBCirculationTransaction {
            client: self.client.clone(),
            books_table: self.books_table.to_string(),
            loans_table: self.loans_table.to_string(),
            loans_index: self.loans_index.to_string(),
            fines_table: self.fines_table.to_string(),
            locked_books: HashSet::new(),
            staged_loans: vec![],
            items: vec![],
        }))
    }
}

// Optimistic unit of work: reads are strongly consistent and every write is
// conditioned on the version that was read, so commit fails as a whole when another
// writer got there first.
pub struct DDBCirculationTransaction {
    client: Client,
    books_table: String,
    loans_table: String,
    loans_index: String,
    fines_table: String,
    locked_books: HashSet<String>,
    staged_loans: Vec<LoanEntity>,
    items: Vec<TransactWriteItem>,
}

impl DDBCirculationTransaction {
    async fn get_loan(&self, loan_id: &str) -> LibraryResult<Option<LoanEntity>> {
        let res = self.client
            .get_item()
            .table_name(self.loans_table.as_str())
            .consistent_read(true)
            .key("loan_id", AttributeValue::S(loan_id.to_string()))
            .send()
            .await?;
        match res.item() {
            Some(map) => Ok(Some(parse_entity(map)?)),
            None => Ok(None),
        }
    }

    // staged loans win over stored ones with the same id
    fn overlay(&self, stored: Vec<LoanEntity>) -> Vec<LoanEntity> {
        let mut by_id: HashMap<String, LoanEntity> = stored.into_iter()
            .map(|l| (l.loan_id.clone(), l))
            .collect();
        for loan in &self.staged_loans {
            by_id.insert(loan.loan_id.clone(), loan.clone());
        }
        by_id.into_values().collect()
    }

    fn put(&mut self, put: Put) {
        self.items.push(TransactWriteItem::builder().put(put).build());
    }
}

#[async_trait]
impl CirculationTransaction for DDBCirculationTransaction {
    async fn lock_book(&mut self, isbn: &str) -> LibraryResult<Option<BookEntity>> {
        let res = self.client
            .get_item()
            .table_name(self.books_table.as_str())
            .consistent_read(true)
            .key("isbn", AttributeValue::S(isbn.to_string()))
            .send()
            .await?;
        self.locked_books.insert(isbn.to_string());
        match res.item() {
            Some(map) => Ok(Some(parse_entity(map)?)),
            None => Ok(None),
        }
    }

    async fn lock_open_loan(&mut self, isbn: &str, patron_id: i64) -> LibraryResult<Option<LoanEntity>> {
        let staged: Vec<LoanEntity> = self.staged_loans.iter()
            .filter(|l| l.isbn == isbn && l.patron_id == patron_id)
            .cloned()
            .collect();
        if !staged.is_empty() {
            return Ok(earliest_open(self.overlay(staged)));
        }
        let res = self.client
            .get_item()
            .table_name(self.loans_table.as_str())
            .consistent_read(true)
            .key("loan_id", AttributeValue::S(open_loan_marker(isbn, patron_id)))
            .send()
            .await?;
        let open_loan_id = res.item().and_then(|map| parse_string_attribute("open_loan_id", map));
        match open_loan_id {
            Some(loan_id) => {
                let loan = self.get_loan(loan_id.as_str()).await?;
                if loan.is_none() {
                    return Err(LibraryError::invariant_violation(
                        format!("open loan marker for {} and patron {} points to missing loan {}",
                                isbn, patron_id, loan_id).as_str()));
                }
                Ok(loan.filter(LoanEntity::is_open))
            }
            None => Ok(None),
        }
    }

    async fn active_loans(&mut self, patron_id: i64) -> LibraryResult<Vec<LoanEntity>> {
        let stored = query_open_loans(&self.client, self.loans_table.as_str(),
                                      self.loans_index.as_str(), patron_id, OPEN_LOANS_PAGE_SIZE).await?;
        let mut loans: Vec<LoanEntity> = self.overlay(stored).into_iter()
            .filter(|l| l.patron_id == patron_id && l.is_open())
            .collect();
        loans.sort_by(|a, b| a.checkout_date.cmp(&b.checkout_date).then_with(|| a.loan_id.cmp(&b.loan_id)));
        Ok(loans)
    }

    async fn update_book(&mut self, book: &BookEntity) -> LibraryResult<()> {
        if !self.locked_books.contains(&book.isbn) {
            return Err(LibraryError::runtime(
                format!("book {} must be locked before it is updated", book.isbn).as_str(), None));
        }
        let mut next = book.clone();
        next.version += 1;
        let put = Put::builder()
            .table_name(self.books_table.as_str())
            .set_item(Some(to_item(&next, &[])?))
            .condition_expression("#version = :expected_version")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":expected_version", AttributeValue::N(book.version.to_string()))
            .build();
        self.put(put);
        Ok(())
    }

    async fn insert_loan(&mut self, loan: &LoanEntity) -> LibraryResult<()> {
        let loan_put = Put::builder()
            .table_name(self.loans_table.as_str())
            .set_item(Some(to_item(loan, &[("patron_key", patron_key(loan.patron_id))])?))
            .condition_expression("attribute_not_exists(loan_id)")
            .build();
        let marker_put = Put::builder()
            .table_name(self.loans_table.as_str())
            .item("loan_id", AttributeValue::S(open_loan_marker(loan.isbn.as_str(), loan.patron_id)))
            .item("open_loan_id", AttributeValue::S(loan.loan_id.to_string()))
            .condition_expression("attribute_not_exists(loan_id)")
            .build();
        self.put(loan_put);
        self.put(marker_put);
        self.staged_loans.push(loan.clone());
        Ok(())
    }

    async fn close_loan(&mut self, loan: &LoanEntity) -> LibraryResult<()> {
        let mut next = loan.clone();
        next.version += 1;
        let loan_put = Put::builder()
            .table_name(self.loans_table.as_str())
            .set_item(Some(to_item(&next, &[("patron_key", patron_key(loan.patron_id))])?))
            .condition_expression("#version = :expected_version")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":expected_version", AttributeValue::N(loan.version.to_string()))
            .build();
        let marker_delete = Delete::builder()
            .table_name(self.loans_table.as_str())
            .key("loan_id", AttributeValue::S(open_loan_marker(loan.isbn.as_str(), loan.patron_id)))
            .condition_expression("open_loan_id = :loan_id")
            .expression_attribute_values(":loan_id", AttributeValue::S(loan.loan_id.to_string()))
            .build();
        self.put(loan_put);
        self.items.push(TransactWriteItem::builder().delete(marker_delete).build());
        self.staged_loans.push(next);
        Ok(())
    }

    async fn insert_fine(&mut self, fine: &FineEntity) -> LibraryResult<()> {
        let put = Put::builder()
            .table_name(self.fines_table.as_str())
            .set_item(Some(to_item(fine, &[])?))
            .condition_expression("attribute_not_exists(fine_id)")
            .build();
        self.put(put);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> LibraryResult<()> {
        let DDBCirculationTransaction { client, items, .. } = *self;
        if items.is_empty() {
            return Ok(());
        }
        debug!("committing {} transact items", items.len());
        client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map(|_| ())
            .map_err(LibraryError::from)
    }

    async fn rollback(self: Box<Self>) {
        debug!("discarding {} transact items", self.items.len());
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use aws_sdk_dynamodb::Client;
    use chrono::Utc;
    use lazy_static::lazy_static;
    use crate::books::domain::model::BookEntity;
    use crate::books::repository::ddb_book_repository::DDBBookRepository;
    use crate::books::repository::BookRepository;
    use crate::checkout::domain::model::LoanEntity;
    use crate::checkout::repository::CirculationStore;
    use crate::checkout::repository::ddb_circulation_store::{open_loan_marker, DDBCirculationStore};
    use crate::core::library::LibraryError;
    use crate::core::repository::{Repository, RepositoryStore};
    use crate::utils::ddb::{build_db_client, create_table, delete_table};

    lazy_static! {
        static ref CLIENT: AsyncOnce<Client> = AsyncOnce::new(async {
                let client = build_db_client(RepositoryStore::LocalDynamoDB).await;
                for table in ["tx_books", "tx_loans", "tx_fines"] {
                    let _ = delete_table(&client, table).await;
                }
                let _ = create_table(&client, "tx_books", "isbn", None).await;
                let _ = create_table(&client, "tx_loans", "loan_id", Some(("patron_key", "checkout_date"))).await;
                let _ = create_table(&client, "tx_fines", "fine_id", Some(("loan_id", "fine_date"))).await;
                client
            });
    }

    #[tokio::test]
    async fn test_should_build_marker_key() {
        assert_eq!("open#isbn#7", open_loan_marker("isbn", 7).as_str());
    }

    #[tokio::test]
    #[ignore = "requires dynamodb-local"]
    async fn test_should_fail_commit_on_stale_version() {
        let client = CLIENT.get().await.clone();
        let books = DDBBookRepository::new(client.clone(), "tx_books");
        let now = Utc::now().naive_utc();
        books.create(&BookEntity::new("tx_isbn", "title", None, None, vec![], now)).await.expect("should create");
        books.add_copies("tx_isbn", 1, now).await.expect("should add copies");
        let store = DDBCirculationStore::new(client, "tx_books", "tx_loans", "tx_loans_ndx", "tx_fines");

        let mut first = store.begin().await.expect("should begin");
        let mut second = store.begin().await.expect("should begin");
        for (tx, patron_id) in [(&mut first, 1), (&mut second, 2)] {
            let mut book = tx.lock_book("tx_isbn").await.expect("should read").expect("should exist");
            book.take_copy(now).expect("should take copy");
            tx.update_book(&book).await.expect("should stage");
            tx.insert_loan(&LoanEntity::new("main", "tx_isbn", patron_id, now.date(), 14, now)).await.expect("should stage");
        }
        first.commit().await.expect("first commit should win");
        let res = second.commit().await;
        assert!(matches!(res, Err(LibraryError::TransactionFailed { retryable: true, .. })));

        let mut tx = store.begin().await.expect("should begin");
        assert!(tx.lock_open_loan("tx_isbn", 1).await.expect("should read").is_some());
        assert!(tx.lock_open_loan("tx_isbn", 2).await.expect("should read").is_none());
        assert_eq!(1, tx.active_loans(1).await.expect("should query").len());
    }
}
