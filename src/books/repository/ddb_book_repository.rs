use std::cmp;
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use chrono::NaiveDateTime;
use tracing::debug;

use crate::books::domain::Book;
use crate::books::domain::model::BookEntity;
use crate::books::repository::BookRepository;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::date::DATE_FMT;
use crate::utils::ddb::{add_filter_expr, filter_value, from_ddb, parse_entity, put_condition_failed, to_ddb_page, to_item, update_condition_failed};

#[derive(Debug)]
pub struct DDBBookRepository {
    client: Client,
    table_name: String,
}

impl DDBBookRepository {
    pub(crate) fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }

    async fn scan_available(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        let predicate = HashMap::from([("available_copies:>".to_string(), "0".to_string())]);
        self.query(&predicate, page, page_size).await
    }
}

#[async_trait]
impl Repository<BookEntity> for DDBBookRepository {
    async fn create(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .put_item()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(isbn)")
            .set_item(Some(to_item(entity, &[])?))
            .send()
            .await.map(|_| 1).map_err(|err| {
            if put_condition_failed(&err) {
                LibraryError::duplicate_key(format!("book {} already exists", entity.isbn).as_str())
            } else {
                LibraryError::from(err)
            }
        })
    }

    async fn get(&self, id: &str) -> LibraryResult<BookEntity> {
        let table_name: &str = self.table_name.as_ref();
        let res = self.client
            .get_item()
            .table_name(table_name)
            .consistent_read(true)
            .key("isbn", AttributeValue::S(id.to_string()))
            .send()
            .await?;
        match res.item() {
            Some(map) => parse_entity(map),
            None => Err(LibraryError::not_found(format!("book not found for {}", id).as_str())),
        }
    }

    // Note you cannot use certain reserved words per https://docs.aws.amazon.com/amazondynamodb/latest/developerguide/ReservedWords.html
    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let mut request = self.client
            .scan()
            .table_name(table_name)
            .consistent_read(false)
            .set_exclusive_start_key(to_ddb_page(page))
            .limit(cmp::min(page_size, 500) as i32);
        let mut filter_expr = String::new();
        for (k, v) in predicate {
            let ks = add_filter_expr(k.as_str(), &mut filter_expr);
            request = request.expression_attribute_values(format!(":{}", ks).as_str(), filter_value(ks.as_str(), v));
        }
        if !filter_expr.is_empty() {
            request = request.filter_expression(filter_expr);
        }
        let res = request.send().await?;
        let records = res.items().unwrap_or_default().iter()
            .map(parse_entity)
            .collect::<LibraryResult<Vec<BookEntity>>>()?;
        Ok(from_ddb(page, page_size, res.last_evaluated_key(), records))
    }
}

#[async_trait]
impl BookRepository for DDBBookRepository {
    async fn add_copies(&self, isbn: &str, count: i64, now: NaiveDateTime) -> LibraryResult<BookEntity> {
        if count <= 0 {
            return Err(LibraryError::validation(
                format!("copies to add must be positive but was {}", count).as_str(), Some("400".to_string())));
        }
        let table_name: &str = self.table_name.as_ref();
        // bumping version makes in-flight circulation transactions on this isbn retry
        let res = self.client
            .update_item()
            .table_name(table_name)
            .key("isbn", AttributeValue::S(isbn.to_string()))
            .update_expression("SET total_copies = total_copies + :count, available_copies = available_copies + :count, #version = #version + :one, updated_at = :updated_at")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":count", AttributeValue::N(count.to_string()))
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .expression_attribute_values(":updated_at", AttributeValue::S(now.format(DATE_FMT).to_string()))
            .condition_expression("attribute_exists(isbn)")
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|err| {
                if update_condition_failed(&err) {
                    LibraryError::not_found(format!("book not found for {}", isbn).as_str())
                } else {
                    LibraryError::from(err)
                }
            })?;
        match res.attributes() {
            Some(map) => parse_entity(map),
            None => self.get(isbn).await,
        }
    }

    async fn search_available(&self, term: &str, limit: usize) -> LibraryResult<Vec<BookEntity>> {
        // contains() in ddb is case-sensitive so the term is matched after the scan
        let mut found = vec![];
        let mut next_page: Option<String> = None;
        loop {
            let res = self.scan_available(next_page.as_deref(), 100).await?;
            found.extend(res.records.into_iter().filter(|b| b.matches_term(term)));
            next_page = res.next_page;
            if found.len() >= limit || next_page.is_none() {
                break;
            }
        }
        found.truncate(limit);
        debug!("search for {} found {} books", term, found.len());
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use aws_sdk_dynamodb::Client;
    use chrono::Utc;
    use lazy_static::lazy_static;

    use crate::books::domain::model::BookEntity;
    use crate::books::repository::BookRepository;
    use crate::books::repository::ddb_book_repository::DDBBookRepository;
    use crate::core::library::LibraryError;
    use crate::core::repository::{Repository, RepositoryStore};
    use crate::utils::ddb::{build_db_client, create_table, delete_table};

    lazy_static! {
        static ref CLIENT: AsyncOnce<Client> = AsyncOnce::new(async {
                let client = build_db_client(RepositoryStore::LocalDynamoDB).await;
                let _ = delete_table(&client, "test_books").await;
                let _ = create_table(&client, "test_books", "isbn", None).await;
                client
            });
    }

    fn new_book(isbn: &str, title: &str) -> BookEntity {
        BookEntity::new(isbn, title, Some("Ace".to_string()), Some(1965),
                        vec!["Frank Herbert".to_string()], Utc::now().naive_utc())
    }

    #[tokio::test]
    #[ignore = "requires dynamodb-local"]
    async fn test_should_create_get_books() {
        let books_repo = DDBBookRepository::new(CLIENT.get().await.clone(), "test_books");
        let book = new_book("ddb_isbn_1", "test book");
        let size = books_repo.create(&book).await.expect("should create book");
        assert_eq!(1, size);
        let loaded = books_repo.get("ddb_isbn_1").await.expect("should return book");
        assert_eq!(book, loaded);
        assert!(matches!(books_repo.create(&book).await, Err(LibraryError::DuplicateKey { .. })));
    }

    #[tokio::test]
    #[ignore = "requires dynamodb-local"]
    async fn test_should_add_copies_and_search() {
        let books_repo = DDBBookRepository::new(CLIENT.get().await.clone(), "test_books");
        books_repo.create(&new_book("ddb_isbn_2", "Children of Dune")).await.expect("should create book");
        let book = books_repo.add_copies("ddb_isbn_2", 2, Utc::now().naive_utc()).await.expect("should add copies");
        assert_eq!(2, book.total_copies);
        assert_eq!(2, book.available_copies);
        assert_eq!(1, book.version);
        assert!(matches!(books_repo.add_copies("ddb_missing", 2, Utc::now().naive_utc()).await, Err(LibraryError::NotFound { .. })));
        let found = books_repo.search_available("children", 20).await.expect("should search");
        assert!(found.iter().any(|b| b.isbn == "ddb_isbn_2"));
    }
}
