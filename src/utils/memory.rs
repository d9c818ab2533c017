use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::OwnedMutexGuard;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};

// A pending change of one row; applied together with the rest of its batch or not at all.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MemoryWrite {
    Insert { table: String, key: String, row: Value },
    Put { table: String, key: String, row: Value },
    Delete { table: String, key: String },
}

impl MemoryWrite {
    pub(crate) fn insert<T: Serialize>(table: &str, key: &str, entity: &T) -> LibraryResult<Self> {
        Ok(MemoryWrite::Insert { table: table.to_string(), key: key.to_string(), row: serde_json::to_value(entity)? })
    }

    pub(crate) fn put<T: Serialize>(table: &str, key: &str, entity: &T) -> LibraryResult<Self> {
        Ok(MemoryWrite::Put { table: table.to_string(), key: key.to_string(), row: serde_json::to_value(entity)? })
    }

    pub(crate) fn target(&self) -> (&str, &str) {
        match self {
            MemoryWrite::Insert { table, key, .. } => { (table.as_str(), key.as_str()) }
            MemoryWrite::Put { table, key, .. } => { (table.as_str(), key.as_str()) }
            MemoryWrite::Delete { table, key } => { (table.as_str(), key.as_str()) }
        }
    }
}

const PRUNE_LOCKS_ABOVE: usize = 256;

// MemoryDatabase is a process-local document store. Rows are JSON documents keyed per
// table; row locks are async mutexes keyed by `table/key` that a transaction holds
// until it commits or is dropped.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: RwLock<HashMap<String, BTreeMap<String, Value>>>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    sequences: Mutex<HashMap<String, i64>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn lock_row(&self, table: &str, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            if locks.len() >= PRUNE_LOCKS_ABOVE {
                // only the map refers to an idle lock, so nobody holds or awaits it
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(row_lock_key(table, key)).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub(crate) fn get<T: DeserializeOwned>(&self, table: &str, key: &str) -> LibraryResult<Option<T>> {
        let tables = self.tables.read();
        match tables.get(table).and_then(|rows| rows.get(key)) {
            Some(row) => Ok(Some(serde_json::from_value(row.clone())?)),
            None => Ok(None),
        }
    }

    pub(crate) fn insert<T: Serialize>(&self, table: &str, key: &str, entity: &T) -> LibraryResult<()> {
        self.apply(vec![MemoryWrite::insert(table, key, entity)?])
    }

    pub(crate) fn put<T: Serialize>(&self, table: &str, key: &str, entity: &T) -> LibraryResult<()> {
        self.apply(vec![MemoryWrite::put(table, key, entity)?])
    }

    pub(crate) fn scan<T: DeserializeOwned>(&self, table: &str,
                                            predicate: &HashMap<String, String>) -> LibraryResult<Vec<T>> {
        self.scan_rows(table).into_iter()
            .filter(|(_, row)| matches_predicate(row, predicate))
            .map(|(_, row)| serde_json::from_value(row).map_err(LibraryError::from))
            .collect()
    }

    pub(crate) fn scan_rows(&self, table: &str) -> Vec<(String, Value)> {
        let tables = self.tables.read();
        tables.get(table)
            .map(|rows| rows.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    // Applies every write under one table lock so readers observe all of them or none.
    pub(crate) fn apply(&self, writes: Vec<MemoryWrite>) -> LibraryResult<()> {
        let mut tables = self.tables.write();
        for write in &writes {
            if let MemoryWrite::Insert { table, key, .. } = write {
                if tables.get(table).map(|rows| rows.contains_key(key)).unwrap_or(false) {
                    return Err(LibraryError::duplicate_key(
                        format!("{} with key {} already exists", table, key).as_str()));
                }
            }
        }
        for write in writes {
            match write {
                MemoryWrite::Insert { table, key, row } | MemoryWrite::Put { table, key, row } => {
                    tables.entry(table).or_default().insert(key, row);
                }
                MemoryWrite::Delete { table, key } => {
                    if let Some(rows) = tables.get_mut(&table) {
                        rows.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn next_sequence(&self, name: &str) -> i64 {
        let mut sequences = self.sequences.lock();
        let next = sequences.entry(name.to_string()).or_insert(0);
        *next += 1;
        *next
    }
}

pub(crate) fn row_lock_key(table: &str, key: &str) -> String {
    format!("{}/{}", table, key)
}

// Predicate keys are attribute names with an optional `:op` suffix, e.g. `due_date:<`.
pub(crate) fn matches_predicate(row: &Value, predicate: &HashMap<String, String>) -> bool {
    predicate.iter().all(|(k, expected)| {
        let (attr, op) = match k.split_once(':') {
            Some((attr, op)) => (attr, op),
            None => (k.as_str(), "="),
        };
        let actual = match row.get(attr) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let ord = compare_values(actual.as_str(), expected.as_str());
        match op {
            "=" => ord == Ordering::Equal,
            "<>" => ord != Ordering::Equal,
            "<" => ord == Ordering::Less,
            "<=" => ord != Ordering::Greater,
            ">" => ord == Ordering::Greater,
            ">=" => ord != Ordering::Less,
            _ => false,
        }
    })
}

fn compare_values(actual: &str, expected: &str) -> Ordering {
    match (actual.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => actual.cmp(expected),
    }
}

// Pages are plain offsets into the already filtered and ordered records.
pub(crate) fn paginate<T>(records: Vec<T>, page: Option<&str>, page_size: usize) -> PaginatedResult<T> {
    let offset = page.and_then(|p| p.parse::<usize>().ok()).unwrap_or(0);
    let page_size = page_size.max(1);
    let total = records.len();
    let records: Vec<T> = records.into_iter().skip(offset).take(page_size).collect();
    let next_page = if offset + records.len() < total {
        Some((offset + records.len()).to_string())
    } else {
        None
    };
    PaginatedResult::new(page, page_size, next_page, records)
}
