use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::core::domain::Identifiable;
use crate::core::library::{LibraryError, LibraryResult};
use crate::utils::date::serializer;

// BookMetadata is what the upstream catalog knows about an isbn
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BookMetadata {
    pub isbn: String,
    pub title: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub authors: Vec<String>,
}

impl BookMetadata {
    pub fn new(isbn: &str, title: &str, authors: &[&str]) -> Self {
        Self {
            isbn: isbn.to_string(),
            title: title.to_string(),
            publisher: None,
            publication_year: None,
            authors: authors.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Reads a volume in the Google Books layout, i.e. `{"volumeInfo": {"title": ..,
    /// "authors": [..], "publisher": .., "publishedDate": "1965-08-01"}}`. Only the
    /// leading year of `publishedDate` is kept.
    pub fn from_volume(isbn: &str, volume: &Value) -> Self {
        let info = volume.get("volumeInfo").unwrap_or(volume);
        let text = |name: &str| info.get(name).and_then(Value::as_str).map(str::to_string);
        let publication_year = text("publishedDate")
            .and_then(|date| date.split('-').next().and_then(|year| year.parse::<i32>().ok()));
        let authors = info.get("authors")
            .and_then(Value::as_array)
            .map(|authors| authors.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            isbn: isbn.to_string(),
            title: text("title").unwrap_or_default(),
            publisher: text("publisher"),
            publication_year,
            authors,
        }
    }

    // a book cannot be catalogued without a title and at least one author
    pub fn validate(&self) -> LibraryResult<()> {
        if self.title.trim().is_empty() || self.authors.is_empty() {
            return Err(LibraryError::validation(
                format!("metadata for {} is missing title or authors", self.isbn).as_str(), Some("400".to_string())));
        }
        Ok(())
    }
}

// MetadataCacheEntity keeps the last upstream answer for an isbn
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MetadataCacheEntity {
    pub isbn: String,
    pub metadata: BookMetadata,
    #[serde(with = "serializer")]
    pub cached_at: NaiveDateTime,
}

impl MetadataCacheEntity {
    pub fn new(metadata: &BookMetadata, now: NaiveDateTime) -> Self {
        Self {
            isbn: metadata.isbn.to_string(),
            metadata: metadata.clone(),
            cached_at: now,
        }
    }

    // fresh while fewer than freshness_days whole days have passed
    pub fn is_fresh(&self, now: NaiveDateTime, freshness_days: i64) -> bool {
        (now - self.cached_at).num_days() < freshness_days
    }
}

impl Identifiable for MetadataCacheEntity {
    fn id(&self) -> String {
        self.isbn.to_string()
    }

    fn version(&self) -> i64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use serde_json::json;
    use crate::catalog::domain::model::{BookMetadata, MetadataCacheEntity};

    #[tokio::test]
    async fn test_should_read_volume() {
        let volume = json!({"volumeInfo": {
            "title": "The Martian",
            "authors": ["Andy Weir"],
            "publisher": "Crown",
            "publishedDate": "2014-02-11"}});
        let metadata = BookMetadata::from_volume("9780804139024", &volume);
        assert_eq!("The Martian", metadata.title.as_str());
        assert_eq!(vec!["Andy Weir".to_string()], metadata.authors);
        assert_eq!(Some("Crown".to_string()), metadata.publisher);
        assert_eq!(Some(2014), metadata.publication_year);
        assert!(metadata.validate().is_ok());
    }

    #[tokio::test]
    async fn test_should_reject_volume_without_authors() {
        let volume = json!({"volumeInfo": {"title": "Anonymous", "publishedDate": "n/a"}});
        let metadata = BookMetadata::from_volume("isbn", &volume);
        assert_eq!(None, metadata.publication_year);
        assert!(metadata.validate().is_err());
        assert!(BookMetadata::new("isbn", " ", &["author"]).validate().is_err());
    }

    #[tokio::test]
    async fn test_should_check_freshness() {
        let cached_at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
        let entry = MetadataCacheEntity::new(&BookMetadata::new("isbn", "title", &["author"]), cached_at);
        assert!(entry.is_fresh(cached_at + Duration::days(6), 7));
        assert!(entry.is_fresh(cached_at + Duration::days(7) - Duration::minutes(1), 7));
        assert!(!entry.is_fresh(cached_at + Duration::days(7), 7));
    }
}
