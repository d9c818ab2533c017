use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::patrons::domain::model::PatronEntity;
use crate::patrons::Patron;
use crate::utils::date::serializer;

// PatronDto is a data transfer object for the patrons service
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PatronDto {
    pub patron_id: i64,
    pub version: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
}

impl Identifiable for PatronDto {
    fn id(&self) -> String {
        self.patron_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl Patron for PatronDto {
    fn patron_id(&self) -> i64 {
        self.patron_id
    }

    fn email(&self) -> &str {
        self.email.as_str()
    }

    fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

impl From<&PatronEntity> for PatronDto {
    fn from(other: &PatronEntity) -> Self {
        Self {
            patron_id: other.patron_id,
            version: other.version,
            first_name: other.first_name.to_string(),
            last_name: other.last_name.to_string(),
            email: other.email.to_string(),
            created_at: other.created_at,
        }
    }
}

// PatronSummary is a patron together with the number of books they currently hold
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PatronSummary {
    pub patron: PatronDto,
    pub active_loans: usize,
}
