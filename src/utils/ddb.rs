use std::collections::HashMap;
use std::time::Duration;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeDefinition, AttributeValue, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection, ProjectionType, ProvisionedThroughput, ScalarAttributeType, TableStatus};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::RepositoryStore;

pub(crate) const BOOKS_TABLE: &str = "books";
pub(crate) const LOANS_TABLE: &str = "loans";
pub(crate) const FINES_TABLE: &str = "fines";
pub(crate) const PATRONS_TABLE: &str = "patrons";
pub(crate) const METADATA_CACHE_TABLE: &str = "metadata_cache";
pub(crate) const EVENTS_TABLE: &str = "events";

const LOCAL_ENDPOINT_ENV: &str = "DYNAMODB_ENDPOINT";
const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:8000";

pub(crate) fn index_name(table_name: &str) -> String {
    format!("{}_ndx", table_name)
}

// creates every table used by the circulation service, skipping the ones that exist
pub(crate) async fn create_tables(client: &Client) -> LibraryResult<()> {
    let tables: [(&str, &str, Option<(&str, &str)>); 6] = [
        (BOOKS_TABLE, "isbn", None),
        (LOANS_TABLE, "loan_id", Some(("patron_key", "checkout_date"))),
        (FINES_TABLE, "fine_id", Some(("loan_id", "fine_date"))),
        (PATRONS_TABLE, "patron_key", None),
        (METADATA_CACHE_TABLE, "isbn", None),
        (EVENTS_TABLE, "event_id", Some(("group", "key"))),
    ];
    for (table_name, pk, gsi) in tables {
        if describe_table(client, table_name).await.is_ok() {
            continue;
        }
        create_table(client, table_name, pk, gsi).await?;
    }
    Ok(())
}

pub(crate) async fn create_table(client: &Client,
                                 table_name: &str, pk: &str,
                                 gsi: Option<(&str, &str)>) -> LibraryResult<()> {
    let mut request = client
        .create_table()
        .table_name(table_name)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(pk)
                .key_type(KeyType::Hash)
                .build(),
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(pk)
                .attribute_type(ScalarAttributeType::S)
                .build(),
        )
        .provisioned_throughput(
            ProvisionedThroughput::builder()
                .read_capacity_units(10)
                .write_capacity_units(10)
                .build(),
        );
    if let Some((gsi_pk, gsi_sk)) = gsi {
        let index = GlobalSecondaryIndex::builder()
            .index_name(index_name(table_name))
            .key_schema(KeySchemaElement::builder()
                .attribute_name(gsi_pk)
                .key_type(KeyType::Hash).build())
            .key_schema(KeySchemaElement::builder()
                .attribute_name(gsi_sk)
                .key_type(KeyType::Range).build())
            .projection(Projection::builder().projection_type(ProjectionType::All).build())
            .provisioned_throughput(
                ProvisionedThroughput::builder().read_capacity_units(10).write_capacity_units(10).build())
            .build();
        request = request
            .global_secondary_indexes(index)
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name(gsi_pk)
                    .attribute_type(ScalarAttributeType::S)
                    .build(),
            )
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name(gsi_sk)
                    .attribute_type(ScalarAttributeType::S)
                    .build(),
            );
    }

    match request.send().await {
        Ok(_k) => {
            wait_until_table_status_is_not(client, table_name, TableStatus::Creating).await;
            Ok(())
        }
        Err(err) => {
            Err(LibraryError::database_or_unavailable(format!("failed to create {} table due to {}",
                                                              table_name, err).as_str(), None, false))
        }
    }
}

pub(crate) async fn delete_table(client: &Client, table_name: &str) -> LibraryResult<()> {
    match client.delete_table().table_name(table_name).send().await {
        Ok(_k) => {
            wait_until_table_status_is_not(client, table_name, TableStatus::Deleting).await;
            Ok(())
        }
        Err(err) => {
            Err(LibraryError::database_or_unavailable(format!("failed to delete {} table due to {}",
                                                              table_name, err).as_str(), None, false))
        }
    }
}

async fn wait_until_table_status_is_not(client: &Client, table_name: &str, other_status: TableStatus) {
    for _i in 0..30 {
        match describe_table(client, table_name).await {
            Ok(status) => {
                if status != other_status {
                    return;
                }
            }
            Err(_err) => {}
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

async fn describe_table(client: &Client, table_name: &str) -> LibraryResult<TableStatus> {
    match client
        .describe_table()
        .table_name(table_name)
        .send()
        .await
    {
        Ok(out) => {
            if let Some(table) = out.table() {
                if let Some(status) = table.table_status() {
                    return Ok(status.clone());
                }
            }
            Err(LibraryError::runtime(format!("failed to describe {} table",
                                              table_name).as_str(), None))
        }
        Err(err) => {
            Err(LibraryError::database_or_unavailable(format!("failed to describe {} table due to {}",
                                                              table_name, err).as_str(), None, false))
        }
    }
}

fn parse_item(value: Value) -> Result<HashMap<String, AttributeValue>, String> {
    match value_to_item(value) {
        AttributeValue::M(map) => Ok(map),
        other => Err(format!("failed to parse{:?}", other)),
    }
}

// serializes an entity into an item, extra attributes are added on top (e.g. index keys)
pub(crate) fn to_item<T: Serialize>(entity: &T,
                                    extra: &[(&str, AttributeValue)]) -> LibraryResult<HashMap<String, AttributeValue>> {
    let mut item = parse_item(serde_json::to_value(entity)?)?;
    for (k, v) in extra {
        item.insert(k.to_string(), v.clone());
    }
    Ok(item)
}

pub(crate) fn parse_entity<T: DeserializeOwned>(map: &HashMap<String, AttributeValue>) -> LibraryResult<T> {
    let object = map.iter()
        .map(|(k, v)| (k.clone(), item_to_value(v)))
        .collect::<serde_json::Map<String, Value>>();
    Ok(serde_json::from_value(Value::Object(object))?)
}

pub(crate) fn parse_string_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> Option<String> {
    if let Some(AttributeValue::S(str)) = map.get(name) {
        return Some(str.clone());
    }
    None
}

pub(crate) fn parse_number_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> i64 {
    if let Some(AttributeValue::N(str)) = map.get(name) {
        if let Ok(n) = str.parse::<i64>() {
            return n;
        }
    }
    0
}

pub(crate) fn add_filter_expr(k: &str, filter_expr: &mut String) -> String {
    let mut op = "=";
    let mut ks = k;
    let parts = k.split(':').collect::<Vec<&str>>();
    if parts.len() > 1 {
        ks = parts[0];
        op = parts[1];
    }
    if filter_expr.is_empty() {
        filter_expr.push_str(format!("{} {} :{}", ks, op, ks).as_str());
    } else {
        filter_expr.push_str(format!(" AND {} {} :{}", ks, op, ks).as_str());
    }
    ks.to_string()
}

// predicate values are strings; numeric attributes are compared as numbers
pub(crate) fn filter_value(attr: &str, value: &str) -> AttributeValue {
    match attr {
        "patron_id" | "available_copies" | "total_copies" | "version" => AttributeValue::N(value.to_string()),
        _ => AttributeValue::S(value.to_string()),
    }
}

pub(crate) fn to_ddb_page(page: Option<&str>) -> Option<HashMap<String, AttributeValue>> {
    if let Some(page) = page {
        if let Ok(str_map) = serde_json::from_str::<HashMap<String, String>>(page) {
            let mut attr_map = HashMap::new();
            for (k, v) in str_map {
                attr_map.insert(k, AttributeValue::S(v));
            }
            return Some(attr_map);
        }
    }
    None
}

pub(crate) fn from_ddb<T>(page: Option<&str>, page_size: usize,
                          last_evaluated_key: Option<&HashMap<String, AttributeValue>>,
                          records: Vec<T>) -> PaginatedResult<T> {
    let mut next_page: Option<String> = None;
    if let Some(attr_map) = last_evaluated_key {
        let mut str_map = HashMap::new();
        for (k, v) in attr_map {
            if let AttributeValue::S(val) = v {
                str_map.insert(k.clone(), val.to_string());
            }
        }
        if let Ok(j) = serde_json::to_string(&str_map) {
            next_page = Some(j);
        }
    }
    PaginatedResult::new(page, page_size, next_page, records)
}

fn value_to_item(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(a) => AttributeValue::L(a.into_iter().map(value_to_item).collect()),
        Value::Object(o) => {
            AttributeValue::M(o.into_iter().map(|(k, v)| (k, value_to_item(v))).collect())
        }
    }
}

fn item_to_value(attr: &AttributeValue) -> Value {
    match attr {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => {
            if let Ok(i) = n.parse::<i64>() {
                Value::from(i)
            } else if let Ok(f) = n.parse::<f64>() {
                Value::from(f)
            } else {
                Value::String(n.clone())
            }
        }
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::L(l) => Value::Array(l.iter().map(item_to_value).collect()),
        AttributeValue::Ss(ss) => Value::Array(ss.iter().map(|s| Value::String(s.clone())).collect()),
        AttributeValue::M(m) => {
            Value::Object(m.iter().map(|(k, v)| (k.clone(), item_to_value(v))).collect())
        }
        _ => Value::Null,
    }
}

// helper method to build db-client with tracing enabled
pub(crate) async fn build_db_client(store: RepositoryStore) -> Client {
    match store {
        RepositoryStore::LocalDynamoDB => {
            // See https://docs.aws.amazon.com/sdk-for-rust/latest/dg/dynamodb-local.html
            let endpoint = std::env::var(LOCAL_ENDPOINT_ENV)
                .unwrap_or_else(|_| DEFAULT_LOCAL_ENDPOINT.to_string());
            let dynamodb_local_config = aws_sdk_dynamodb::Config::builder()
                .region(Region::new("local"))
                .credentials_provider(
                    Credentials::new("AKIDLOCALSTACK", "localstacksecret", None, None, "faked"))
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(dynamodb_local_config)
        }
        _ => {
            //Get config from environment.
            let config = aws_config::load_from_env().await;
            //Create the DynamoDB client.
            Client::new(&config)
        }
    }
}

// helper method to build sns-client
pub(crate) async fn build_sns_client() -> aws_sdk_sns::Client {
    //Get config from environment.
    let config = aws_config::load_from_env().await;
    aws_sdk_sns::Client::new(&config)
}

impl From<SdkError<UpdateItemError>> for LibraryError {
    fn from(err: SdkError<UpdateItemError>) -> Self {
        let (retryable, reason) = retryable_sdk_error(&err);
        LibraryError::database_or_unavailable(format!("{:?}", err).as_str(), reason, retryable)
    }
}

impl From<SdkError<PutItemError>> for LibraryError {
    fn from(err: SdkError<PutItemError>) -> Self {
        let (retryable, reason) = retryable_sdk_error(&err);
        LibraryError::database_or_unavailable(format!("{:?}", err).as_str(), reason, retryable)
    }
}

impl From<SdkError<GetItemError>> for LibraryError {
    fn from(err: SdkError<GetItemError>) -> Self {
        let (retryable, reason) = retryable_sdk_error(&err);
        LibraryError::database_or_unavailable(format!("{:?}", err).as_str(), reason, retryable)
    }
}

impl From<SdkError<QueryError>> for LibraryError {
    fn from(err: SdkError<QueryError>) -> Self {
        let (retryable, reason) = retryable_sdk_error(&err);
        LibraryError::database_or_unavailable(format!("{:?}", err).as_str(), reason, retryable)
    }
}

impl From<SdkError<ScanError>> for LibraryError {
    fn from(err: SdkError<ScanError>) -> Self {
        let (retryable, reason) = retryable_sdk_error(&err);
        LibraryError::database_or_unavailable(format!("{:?}", err).as_str(), reason, retryable)
    }
}

// A cancelled transaction means one of its conditions (row version, open-loan marker)
// no longer held: somebody else committed first and the whole unit can be re-run.
impl From<SdkError<TransactWriteItemsError>> for LibraryError {
    fn from(err: SdkError<TransactWriteItemsError>) -> Self {
        if let SdkError::ServiceError(ctx) = &err {
            match ctx.err() {
                TransactWriteItemsError::TransactionCanceledException(_) |
                TransactWriteItemsError::TransactionInProgressException(_) => {
                    warn!("ddb transaction cancelled {:?}", ctx.err());
                    return LibraryError::transaction_failed(
                        format!("ddb transaction cancelled {:?}", ctx.err()).as_str(),
                        Some("TransactionCanceled".to_string()), true);
                }
                _ => {}
            }
        }
        let (retryable, reason) = retryable_sdk_error(&err);
        if retryable {
            LibraryError::transaction_failed(format!("{:?}", err).as_str(), reason, true)
        } else {
            LibraryError::database_or_unavailable(format!("{:?}", err).as_str(), reason, false)
        }
    }
}

// true when a put failed only because its condition (e.g. attribute_not_exists) did not hold
pub(crate) fn put_condition_failed(err: &SdkError<PutItemError>) -> bool {
    matches!(err, SdkError::ServiceError(ctx) if matches!(ctx.err(), PutItemError::ConditionalCheckFailedException(_)))
}

pub(crate) fn update_condition_failed(err: &SdkError<UpdateItemError>) -> bool {
    matches!(err, SdkError::ServiceError(ctx) if matches!(ctx.err(), UpdateItemError::ConditionalCheckFailedException(_)))
}

pub(crate) fn transaction_cancelled(err: &SdkError<TransactWriteItemsError>) -> bool {
    matches!(err, SdkError::ServiceError(ctx) if matches!(ctx.err(), TransactWriteItemsError::TransactionCanceledException(_)))
}

fn retryable_sdk_error<T>(err: &SdkError<T>) -> (bool, Option<String>) {
    match err {
        SdkError::ConstructionFailure(_) => { (false, Some("ConstructionFailure".to_string())) }
        SdkError::TimeoutError(_) => { (true, Some("TimeoutError".to_string())) }
        SdkError::DispatchFailure(_) => { (true, Some("DispatchFailure".to_string())) }
        SdkError::ResponseError { .. } => { (true, Some("ResponseError".to_string())) }
        SdkError::ServiceError(ctx) => {
            (ctx.raw().http().status().is_server_error() || has_exceeded_limit(ctx.raw().http().body().bytes()), Some(ctx.raw().http().status().to_string()))
        }
        _ => { (true, Some("Unknown".to_string())) }
    }
}

fn has_exceeded_limit(opts: Option<&[u8]>) -> bool {
    //"ProvisionedThroughputExceeded", "LimitExceeded"
    opts.map(|b| b.windows(6).any(|w| w == b"ceeded")).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use aws_sdk_dynamodb::types::AttributeValue;
    use serde::{Deserialize, Serialize};
    use crate::utils::ddb::{add_filter_expr, filter_value, from_ddb, has_exceeded_limit, parse_entity, to_item};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        isbn: String,
        copies: i64,
        authors: Vec<String>,
        returned: Option<String>,
    }

    #[tokio::test]
    async fn test_should_convert_entity_to_item_and_back() {
        let row = Row { isbn: "123".to_string(), copies: 3, authors: vec!["Weir".to_string()], returned: None };
        let item = to_item(&row, &[("patron_key", AttributeValue::S("7".to_string()))]).expect("should build item");
        assert_eq!(Some(&AttributeValue::N("3".to_string())), item.get("copies"));
        assert_eq!(Some(&AttributeValue::S("7".to_string())), item.get("patron_key"));
        let back: Row = parse_entity(&item).expect("should parse item");
        assert_eq!(row, back);
    }

    #[tokio::test]
    async fn test_should_build_filter_expr() {
        let mut expr = String::new();
        assert_eq!("loan_status", add_filter_expr("loan_status", &mut expr));
        assert_eq!("due_date", add_filter_expr("due_date:<", &mut expr));
        assert_eq!("loan_status = :loan_status AND due_date < :due_date", expr.as_str());
        assert_eq!(AttributeValue::N("7".to_string()), filter_value("patron_id", "7"));
        assert_eq!(AttributeValue::S("7".to_string()), filter_value("isbn", "7"));
    }

    #[tokio::test]
    async fn test_should_build_next_page() {
        let key = HashMap::from([("loan_id".to_string(), AttributeValue::S("l1".to_string()))]);
        let res = from_ddb(None, 10, Some(&key), vec![1]);
        assert_eq!(Some("{\"loan_id\":\"l1\"}".to_string()), res.next_page);
    }

    #[tokio::test]
    async fn test_should_detect_exceeded_limit() {
        assert!(has_exceeded_limit(Some(b"ProvisionedThroughputExceededException")));
        assert!(!has_exceeded_limit(Some(b"oops")));
        assert!(!has_exceeded_limit(None));
    }
}
