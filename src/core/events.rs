use std::collections::HashMap;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::utils::date::serializer;

// DomainEventType defines type of event for circulation changes
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum DomainEventType {
    Added,
    Updated,
}

// DomainEvent is published after a committed change so other contexts can follow it
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub event_id: String,
    pub name: String,
    pub group: String,
    pub key: String,
    pub kind: DomainEventType,
    pub metadata: HashMap<String, String>,
    pub json_data: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
}

impl DomainEvent {
    pub fn added<T: Serialize>(name: &str, group: &str, key: &str, metadata: &HashMap<String, String>, data: &T) -> serde_json::Result<Self> {
        let json = serde_json::to_string(&data)?;
        Ok(Self::build(name, group, key, DomainEventType::Added, metadata, json))
    }

    pub fn updated<T: Serialize>(name: &str, group: &str, key: &str, metadata: &HashMap<String, String>, data: &T) -> serde_json::Result<Self> {
        let json = serde_json::to_string(&data)?;
        Ok(Self::build(name, group, key, DomainEventType::Updated, metadata, json))
    }

    fn build(name: &str, group: &str, key: &str, kind: DomainEventType, metadata: &HashMap<String, String>, json: String) -> DomainEvent {
        DomainEvent {
            event_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            group: group.to_string(),
            key: key.to_string(),
            kind,
            metadata: metadata.clone(),
            json_data: json,
            created_at: Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use crate::core::events::{DomainEvent, DomainEventType};

    #[tokio::test]
    async fn test_should_build_added() {
        let data = HashMap::from([("isbn", "123")]);
        let event = DomainEvent::added("loan_opened", "checkout", "loan-1", &HashMap::from([("branch".to_string(), "main".to_string())]), &data).expect("build event");
        assert_eq!("loan_opened", event.name.as_str());
        assert_eq!("loan-1", event.key.as_str());
        assert_eq!(DomainEventType::Added, event.kind);
        assert!(event.json_data.contains("123"));
    }

    #[tokio::test]
    async fn test_should_build_updated() {
        let data = HashMap::from([("isbn", "123")]);
        let event = DomainEvent::updated("loan_closed", "checkout", "loan-1", &HashMap::new(), &data).expect("build event");
        assert_eq!("checkout", event.group.as_str());
        assert_eq!(DomainEventType::Updated, event.kind);
    }

    #[tokio::test]
    async fn test_should_serialize_event() {
        let event = DomainEvent::added("book_synced", "catalog", "123", &HashMap::new(), &"123").expect("build event");
        let json = serde_json::to_string(&event).expect("serialize");
        let back: DomainEvent = serde_json::from_str(json.as_str()).expect("deserialize");
        assert_eq!(event.event_id, back.event_id);
        assert_eq!(event.created_at, back.created_at);
    }
}
