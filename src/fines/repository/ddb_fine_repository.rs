use std::cmp;
use std::collections::HashMap;
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::fines::domain::model::FineEntity;
use crate::fines::repository::FineRepository;
use crate::utils::ddb::{add_filter_expr, filter_value, from_ddb, parse_entity, put_condition_failed, to_ddb_page, to_item};

#[derive(Debug)]
pub struct DDBFineRepository {
    client: Client,
    table_name: String,
    index_name: String,
}

impl DDBFineRepository {
    pub(crate) fn new(client: Client, table_name: &str, index_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
            index_name: index_name.to_string(),
        }
    }

    async fn all(&self, predicate: &HashMap<String, String>) -> LibraryResult<Vec<FineEntity>> {
        let mut fines = vec![];
        let mut next_page: Option<String> = None;
        loop {
            let res = self.query(predicate, next_page.as_deref(), 500).await?;
            fines.extend(res.records);
            next_page = res.next_page;
            if next_page.is_none() {
                break;
            }
        }
        Ok(fines)
    }
}

#[async_trait]
impl Repository<FineEntity> for DDBFineRepository {
    async fn create(&self, entity: &FineEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .put_item()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(fine_id)")
            .set_item(Some(to_item(entity, &[])?))
            .send()
            .await.map(|_| 1).map_err(|err| {
            if put_condition_failed(&err) {
                LibraryError::duplicate_key(format!("fine {} already exists", entity.fine_id).as_str())
            } else {
                LibraryError::from(err)
            }
        })
    }

    async fn get(&self, id: &str) -> LibraryResult<FineEntity> {
        let table_name: &str = self.table_name.as_ref();
        let res = self.client
            .get_item()
            .table_name(table_name)
            .key("fine_id", AttributeValue::S(id.to_string()))
            .send()
            .await?;
        match res.item() {
            Some(map) => parse_entity(map),
            None => Err(LibraryError::not_found(format!("fine not found for {}", id).as_str())),
        }
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<FineEntity>> {
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
            .collect::<LibraryResult<Vec<FineEntity>>>()?;
        Ok(from_ddb(page, page_size, res.last_evaluated_key(), records))
    }
}

#[async_trait]
impl FineRepository for DDBFineRepository {
    async fn fines_for_loan(&self, loan_id: &str) -> LibraryResult<Vec<FineEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let index_name: &str = self.index_name.as_ref();
        let res = self.client
            .query()
            .table_name(table_name)
            .index_name(index_name)
            .key_condition_expression("loan_id = :loan_id")
            .expression_attribute_values(":loan_id", AttributeValue::S(loan_id.to_string()))
            .send()
            .await?;
        res.items().unwrap_or_default().iter()
            .map(parse_entity)
            .collect::<LibraryResult<Vec<FineEntity>>>()
    }

    async fn fines_for_patron(&self, patron_id: i64) -> LibraryResult<Vec<FineEntity>> {
        let mut fines = self.all(&HashMap::from([("patron_id".to_string(), patron_id.to_string())])).await?;
        fines.sort_by(|a, b| a.fine_date.cmp(&b.fine_date).then_with(|| a.fine_id.cmp(&b.fine_id)));
        Ok(fines)
    }
}
