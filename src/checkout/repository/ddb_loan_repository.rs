use std::cmp;
use std::collections::HashMap;
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem};
use chrono::NaiveDate;
use crate::checkout::domain::model::LoanEntity;
use crate::checkout::repository::ddb_circulation_store::{open_loan_marker, patron_key, query_open_loans, OPEN_LOANS_PAGE_SIZE};
use crate::checkout::repository::LoanRepository;
use crate::core::library::{LibraryError, LibraryResult, LoanStatus, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::date::DAY_FMT;
use crate::utils::ddb::{add_filter_expr, filter_value, from_ddb, parse_entity, to_ddb_page, to_item, transaction_cancelled};

#[derive(Debug)]
pub struct DDBLoanRepository {
    client: Client,
    table_name: String,
    index_name: String,
}

impl DDBLoanRepository {
    pub(crate) fn new(client: Client, table_name: &str, index_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
            index_name: index_name.to_string(),
        }
    }

    async fn all(&self, predicate: &HashMap<String, String>) -> LibraryResult<Vec<LoanEntity>> {
        let mut loans = vec![];
        let mut next_page: Option<String> = None;
        loop {
            let res = self.query(predicate, next_page.as_deref(), 500).await?;
            loans.extend(res.records);
            next_page = res.next_page;
            if next_page.is_none() {
                break;
            }
        }
        loans.sort_by(|a, b| a.checkout_date.cmp(&b.checkout_date).then_with(|| a.loan_id.cmp(&b.loan_id)));
        Ok(loans)
    }
}

#[async_trait]
impl Repository<LoanEntity> for DDBLoanRepository {
    // open loans are written together with their marker item
    async fn create(&self, entity: &LoanEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        let mut request = self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().put(Put::builder()
                .table_name(table_name)
                .set_item(Some(to_item(entity, &[("patron_key", patron_key(entity.patron_id))])?))
                .condition_expression("attribute_not_exists(loan_id)")
                .build()).build());
        if entity.is_open() {
            request = request.transact_items(TransactWriteItem::builder().put(Put::builder()
                .table_name(table_name)
                .item("loan_id", AttributeValue::S(open_loan_marker(entity.isbn.as_str(), entity.patron_id)))
                .item("open_loan_id", AttributeValue::S(entity.loan_id.to_string()))
                .condition_expression("attribute_not_exists(loan_id)")
                .build()).build());
        }
        request.send().await.map(|_| 1).map_err(|err| {
            if transaction_cancelled(&err) {
                LibraryError::duplicate_key(format!("loan {} or an open loan of patron {} for {} already exists",
                                                    entity.loan_id, entity.patron_id, entity.isbn).as_str())
            } else {
                LibraryError::from(err)
            }
        })
    }

    async fn get(&self, id: &str) -> LibraryResult<LoanEntity> {
        let table_name: &str = self.table_name.as_ref();
        let res = self.client
            .get_item()
            .table_name(table_name)
            .key("loan_id", AttributeValue::S(id.to_string()))
            .send()
            .await?;
        match res.item() {
            Some(map) if map.contains_key("isbn") => parse_entity(map),
            _ => Err(LibraryError::not_found(format!("loan not found for {}", id).as_str())),
        }
    }

    // Note you cannot use certain reserved words per https://docs.aws.amazon.com/amazondynamodb/latest/developerguide/ReservedWords.html
    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let mut request = self.client
            .scan()
            .table_name(table_name)
            .set_exclusive_start_key(to_ddb_page(page))
            .limit(cmp::min(page_size, 500) as i32);
        let mut filter_expr = String::new();
        for (k, v) in predicate {
            let ks = add_filter_expr(k.as_str(), &mut filter_expr);
            request = request.expression_attribute_values(format!(":{}", ks).as_str(), filter_value(ks.as_str(), v));
        }
        // marker items carry no isbn
        if filter_expr.is_empty() {
            filter_expr.push_str("attribute_exists(isbn)");
        } else {
            filter_expr.push_str(" AND attribute_exists(isbn)");
        }
        let res = request.filter_expression(filter_expr).send().await?;
        let records = res.items().unwrap_or_default().iter()
            .map(parse_entity)
            .collect::<LibraryResult<Vec<LoanEntity>>>()?;
        Ok(from_ddb(page, page_size, res.last_evaluated_key(), records))
    }
}

#[async_trait]
impl LoanRepository for DDBLoanRepository {
    async fn find_open_loans(&self, patron_id: i64) -> LibraryResult<Vec<LoanEntity>> {
        query_open_loans(&self.client, self.table_name.as_str(), self.index_name.as_str(),
                         patron_id, OPEN_LOANS_PAGE_SIZE).await
    }

    async fn find_by_isbn(&self, isbn: &str) -> LibraryResult<Vec<LoanEntity>> {
        self.all(&HashMap::from([("isbn".to_string(), isbn.to_string())])).await
    }

    async fn query_overdue(&self, today: NaiveDate,
                           page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanEntity>> {
        let predicate = HashMap::from([
            ("loan_status".to_string(), LoanStatus::Open.to_string()),
            ("due_date:<".to_string(), today.format(DAY_FMT).to_string()),
        ]);
        self.query(&predicate, page, page_size).await
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use aws_sdk_dynamodb::Client;
    use chrono::{Duration, Utc};
    use lazy_static::lazy_static;
    use crate::checkout::domain::model::LoanEntity;
    use crate::checkout::repository::LoanRepository;
    use crate::checkout::repository::ddb_circulation_store::query_open_loans;
    use crate::checkout::repository::ddb_loan_repository::DDBLoanRepository;
    use crate::core::library::LibraryError;
    use crate::core::repository::{Repository, RepositoryStore};
    use crate::utils::ddb::{build_db_client, create_table, delete_table};

    lazy_static! {
        static ref CLIENT: AsyncOnce<Client> = AsyncOnce::new(async {
                let client = build_db_client(RepositoryStore::LocalDynamoDB).await;
                let _ = delete_table(&client, "test_loans").await;
                let _ = create_table(&client, "test_loans", "loan_id", Some(("patron_key", "checkout_date"))).await;
                client
            });
    }

    #[tokio::test]
    #[ignore = "requires dynamodb-local"]
    async fn test_should_create_and_query_loans() {
        let loans_repo = DDBLoanRepository::new(CLIENT.get().await.clone(), "test_loans", "test_loans_ndx");
        let now = Utc::now().naive_utc();
        let overdue = LoanEntity::new("main", "ddb_isbn", 99, now.date() - Duration::days(30), 14, now);
        assert_eq!(1, loans_repo.create(&overdue).await.expect("should create loan"));
        let loaded = loans_repo.get(overdue.loan_id.as_str()).await.expect("should get loan");
        assert_eq!(overdue, loaded);
        let dup = LoanEntity::new("main", "ddb_isbn", 99, now.date(), 14, now);
        assert!(matches!(loans_repo.create(&dup).await, Err(LibraryError::DuplicateKey { .. })));

        let open = loans_repo.find_open_loans(99).await.expect("should find loans");
        assert_eq!(1, open.len());
        let by_isbn = loans_repo.find_by_isbn("ddb_isbn").await.expect("should find loans");
        assert_eq!(1, by_isbn.len());
        let res = loans_repo.query_overdue(now.date(), None, 100).await.expect("should query overdue");
        assert!(res.records.iter().any(|l| l.loan_id == overdue.loan_id));
    }

    #[tokio::test]
    #[ignore = "requires dynamodb-local"]
    async fn test_should_follow_pages_of_open_loans() {
        let client = CLIENT.get().await.clone();
        let loans_repo = DDBLoanRepository::new(client.clone(), "test_loans", "test_loans_ndx");
        let now = Utc::now().naive_utc();
        for i in 0..7 {
            let loan = LoanEntity::new("main", format!("ddb_paged_isbn_{}", i).as_str(), 77,
                                       now.date() - Duration::days(i), 14, now);
            loans_repo.create(&loan).await.expect("should create loan");
        }
        let open = query_open_loans(&client, "test_loans", "test_loans_ndx", 77, 2).await.expect("should query");
        assert_eq!(7, open.len());
        assert!(open.windows(2).all(|w| w[0].checkout_date <= w[1].checkout_date));
        assert_eq!(7, loans_repo.find_open_loans(77).await.expect("should find loans").len());
    }
}
