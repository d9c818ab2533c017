use std::cmp;
use std::collections::HashMap;
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{AttributeValue, Put, ReturnValue, TransactWriteItem};
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::patrons::domain::model::PatronEntity;
use crate::patrons::normalize_email;
use crate::patrons::repository::PatronRepository;
use crate::utils::ddb::{add_filter_expr, filter_value, from_ddb, parse_entity, parse_number_attribute, to_ddb_page, to_item, transaction_cancelled};

const SEQUENCE_KEY: &str = "#seq";

fn email_marker(email: &str) -> String {
    format!("email#{}", normalize_email(email))
}

// Patrons share their table with an id sequence item and one marker item per email;
// only patron items carry an email attribute.
#[derive(Debug)]
pub struct DDBPatronRepository {
    client: Client,
    table_name: String,
}

impl DDBPatronRepository {
    pub(crate) fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }
}

#[async_trait]
impl Repository<PatronEntity> for DDBPatronRepository {
    // the email marker makes a second registration of the same email cancel
    async fn create(&self, entity: &PatronEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().put(Put::builder()
                .table_name(table_name)
                .set_item(Some(to_item(entity, &[("patron_key", AttributeValue::S(entity.patron_id.to_string()))])?))
                .condition_expression("attribute_not_exists(patron_key)")
                .build()).build())
            .transact_items(TransactWriteItem::builder().put(Put::builder()
                .table_name(table_name)
                .item("patron_key", AttributeValue::S(email_marker(entity.email.as_str())))
                .item("patron_id", AttributeValue::N(entity.patron_id.to_string()))
                .condition_expression("attribute_not_exists(patron_key)")
                .build()).build())
            .send()
            .await.map(|_| 1).map_err(|err| {
            if transaction_cancelled(&err) {
                LibraryError::duplicate_key(
                    format!("patron {} or email {} already exists", entity.patron_id, entity.email).as_str())
            } else {
                LibraryError::from(err)
            }
        })
    }

    async fn get(&self, id: &str) -> LibraryResult<PatronEntity> {
        let table_name: &str = self.table_name.as_ref();
        let res = self.client
            .get_item()
            .table_name(table_name)
            .consistent_read(true)
            .key("patron_key", AttributeValue::S(id.to_string()))
            .send()
            .await?;
        match res.item() {
            Some(map) if map.contains_key("email") => parse_entity(map),
            _ => Err(LibraryError::not_found(format!("patron not found for {}", id).as_str())),
        }
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<PatronEntity>> {
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
        if filter_expr.is_empty() {
            filter_expr.push_str("attribute_exists(email)");
        } else {
            filter_expr.push_str(" AND attribute_exists(email)");
        }
        let res = request.filter_expression(filter_expr).send().await?;
        let records = res.items().unwrap_or_default().iter()
            .map(parse_entity)
            .collect::<LibraryResult<Vec<PatronEntity>>>()?;
        Ok(from_ddb(page, page_size, res.last_evaluated_key(), records))
    }
}

#[async_trait]
impl PatronRepository for DDBPatronRepository {
    async fn next_id(&self) -> LibraryResult<i64> {
        let table_name: &str = self.table_name.as_ref();
        let res = self.client
            .update_item()
            .table_name(table_name)
            .key("patron_key", AttributeValue::S(SEQUENCE_KEY.to_string()))
            .update_expression("ADD next_id :one")
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await?;
        match res.attributes() {
            Some(map) if map.contains_key("next_id") => Ok(parse_number_attribute("next_id", map)),
            _ => Err(LibraryError::database("patron id sequence returned no value", None, false)),
        }
    }

    async fn find_by_email(&self, email: &str) -> LibraryResult<Option<PatronEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let res = self.client
            .get_item()
            .table_name(table_name)
            .consistent_read(true)
            .key("patron_key", AttributeValue::S(email_marker(email)))
            .send()
            .await?;
        match res.item() {
            Some(map) => {
                let patron_id = parse_number_attribute("patron_id", map);
                match self.get(patron_id.to_string().as_str()).await {
                    Ok(patron) => Ok(Some(patron)),
                    Err(LibraryError::NotFound { .. }) => Ok(None),
                    Err(err) => Err(err),
                }
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use aws_sdk_dynamodb::Client;
    use chrono::Utc;
    use lazy_static::lazy_static;
    use crate::core::library::LibraryError;
    use crate::core::repository::{Repository, RepositoryStore};
    use crate::patrons::domain::model::PatronEntity;
    use crate::patrons::repository::PatronRepository;
    use crate::patrons::repository::ddb_patron_repository::DDBPatronRepository;
    use crate::utils::ddb::{build_db_client, create_table, delete_table};

    lazy_static! {
        static ref CLIENT: AsyncOnce<Client> = AsyncOnce::new(async {
                let client = build_db_client(RepositoryStore::LocalDynamoDB).await;
                let _ = delete_table(&client, "test_patrons").await;
                let _ = create_table(&client, "test_patrons", "patron_key", None).await;
                client
            });
    }

    #[tokio::test]
    #[ignore = "requires dynamodb-local"]
    async fn test_should_create_and_find_patrons() {
        let patron_repo = DDBPatronRepository::new(CLIENT.get().await.clone(), "test_patrons");
        let first = patron_repo.next_id().await.expect("should allocate");
        let second = patron_repo.next_id().await.expect("should allocate");
        assert_eq!(first + 1, second);

        let patron = PatronEntity::new(first, "Ada", "Lovelace", "ada@example.org", Utc::now().naive_utc());
        patron_repo.create(&patron).await.expect("should create patron");
        let found = patron_repo.find_by_email("Ada@Example.org").await.expect("should find");
        assert_eq!(Some(patron.clone()), found);

        let dup = PatronEntity::new(second, "Ada", "Byron", "ada@example.org", Utc::now().naive_utc());
        assert!(matches!(patron_repo.create(&dup).await, Err(LibraryError::DuplicateKey { .. })));
        let all = patron_repo.query(&Default::default(), None, 10).await.expect("should scan");
        assert_eq!(1, all.records.len());
    }
}
