use std::cmp;
use std::collections::HashMap;
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use crate::catalog::domain::model::MetadataCacheEntity;
use crate::catalog::repository::MetadataCacheRepository;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::ddb::{add_filter_expr, filter_value, from_ddb, parse_entity, put_condition_failed, to_ddb_page, to_item};

#[derive(Debug)]
pub struct DDBMetadataCacheRepository {
    client: Client,
    table_name: String,
}

impl DDBMetadataCacheRepository {
    pub(crate) fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }
}

#[async_trait]
impl Repository<MetadataCacheEntity> for DDBMetadataCacheRepository {
    async fn create(&self, entity: &MetadataCacheEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .put_item()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(isbn)")
            .set_item(Some(to_item(entity, &[])?))
            .send()
            .await.map(|_| 1).map_err(|err| {
            if put_condition_failed(&err) {
                LibraryError::duplicate_key(format!("metadata for {} is already cached", entity.isbn).as_str())
            } else {
                LibraryError::from(err)
            }
        })
    }

    async fn get(&self, id: &str) -> LibraryResult<MetadataCacheEntity> {
        let table_name: &str = self.table_name.as_ref();
        let res = self.client
            .get_item()
            .table_name(table_name)
            .key("isbn", AttributeValue::S(id.to_string()))
            .send()
            .await?;
        match res.item() {
            Some(map) => parse_entity(map),
            None => Err(LibraryError::not_found(format!("no cached metadata for {}", id).as_str())),
        }
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<MetadataCacheEntity>> {
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
        if !filter_expr.is_empty() {
            request = request.filter_expression(filter_expr);
        }
        let res = request.send().await?;
        let records = res.items().unwrap_or_default().iter()
            .map(parse_entity)
            .collect::<LibraryResult<Vec<MetadataCacheEntity>>>()?;
        Ok(from_ddb(page, page_size, res.last_evaluated_key(), records))
    }
}

#[async_trait]
impl MetadataCacheRepository for DDBMetadataCacheRepository {
    async fn upsert(&self, entry: &MetadataCacheEntity) -> LibraryResult<()> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .put_item()
            .table_name(table_name)
            .set_item(Some(to_item(entry, &[])?))
            .send()
            .await.map(|_| ()).map_err(LibraryError::from)
    }
}
