use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::books::domain::Book;
use crate::core::domain::Identifiable;
use crate::core::library::{LibraryError, LibraryResult};
use crate::utils::date::serializer;

// BookEntity is the inventory row of a title: how many copies the branch owns and how
// many of them are on the shelf. Invariant: 0 <= available_copies <= total_copies.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BookEntity {
    pub isbn: String,
    pub version: i64,
    pub title: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub authors: Vec<String>,
    pub total_copies: i64,
    pub available_copies: i64,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl BookEntity {
    // a synced title starts without copies until the branch adds them
    pub fn new(isbn: &str, title: &str, publisher: Option<String>,
               publication_year: Option<i32>, authors: Vec<String>, now: NaiveDateTime) -> Self {
        Self {
            isbn: isbn.to_string(),
            version: 0,
            title: title.to_string(),
            publisher,
            publication_year,
            authors,
            total_copies: 0,
            available_copies: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn take_copy(&mut self, now: NaiveDateTime) -> LibraryResult<()> {
        if self.available_copies <= 0 {
            return Err(LibraryError::out_of_stock(
                format!("no copies of {} are available", self.isbn).as_str()));
        }
        self.available_copies -= 1;
        self.updated_at = now;
        Ok(())
    }

    // Puts a copy back on the shelf. Returns false when the shelf was already full and
    // the count had to be clamped at total_copies.
    pub fn restore_copy(&mut self, now: NaiveDateTime) -> bool {
        self.updated_at = now;
        if self.available_copies >= self.total_copies {
            self.available_copies = self.total_copies;
            return false;
        }
        self.available_copies += 1;
        true
    }

    pub fn add_copies(&mut self, count: i64, now: NaiveDateTime) -> LibraryResult<()> {
        if count <= 0 {
            return Err(LibraryError::validation(
                format!("copies to add must be positive but was {}", count).as_str(), Some("400".to_string())));
        }
        self.total_copies += count;
        self.available_copies += count;
        self.updated_at = now;
        Ok(())
    }
}

impl Identifiable for BookEntity {
    fn id(&self) -> String {
        self.isbn.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl Book for BookEntity {
    fn title(&self) -> &str {
        self.title.as_str()
    }

    fn available_copies(&self) -> i64 {
        self.available_copies
    }
}
