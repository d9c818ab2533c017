use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::patrons::{normalize_email, Patron};
use crate::utils::date::serializer;

// PatronEntity is a registered library member
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PatronEntity {
    pub patron_id: i64,
    pub version: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl PatronEntity {
    pub fn new(patron_id: i64, first_name: &str, last_name: &str, email: &str, now: NaiveDateTime) -> Self {
        Self {
            patron_id,
            version: 0,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: normalize_email(email),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Identifiable for PatronEntity {
    fn id(&self) -> String {
        self.patron_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl Patron for PatronEntity {
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

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use crate::patrons::domain::model::PatronEntity;
    use crate::patrons::Patron;

    #[tokio::test]
    async fn test_should_build_patron() {
        let patron = PatronEntity::new(1, " Ada ", "Lovelace", " Ada@Example.org ", Utc::now().naive_utc());
        assert_eq!("ada@example.org", patron.email());
        assert_eq!("Ada Lovelace", patron.full_name().as_str());
        assert_eq!(1, patron.patron_id());
    }
}
