use std::sync::Arc;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;
use crate::core::events::DomainEvent;
use crate::core::library::LibraryResult;
use crate::gateway::events::EventPublisher;

// LogPublisher writes events to the log and keeps them for inspection. Clones share
// the same list.
#[derive(Debug, Clone, Default)]
pub struct LogPublisher {
    published: Arc<Mutex<Vec<DomainEvent>>>,
}

impl LogPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<DomainEvent> {
        self.published.lock().clone()
    }

    pub fn published_names(&self) -> Vec<String> {
        self.published.lock().iter().map(|e| e.name.to_string()).collect()
    }
}

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: &DomainEvent) -> LibraryResult<()> {
        info!(event_id = event.event_id.as_str(), name = event.name.as_str(), key = event.key.as_str(),
            "published {}", event.json_data);
        self.published.lock().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use crate::core::events::DomainEvent;
    use crate::gateway::events::EventPublisher;
    use crate::gateway::logs::LogPublisher;

    #[tokio::test]
    async fn test_should_keep_published_events() {
        let publisher = LogPublisher::new();
        let shared = publisher.clone();
        let event = DomainEvent::added("loan_opened", "checkout", "loan-1", &HashMap::new(), &"isbn").expect("build event");
        publisher.publish(&event).await.expect("should publish");
        assert_eq!(vec!["loan_opened".to_string()], shared.published_names());
        assert_eq!(event, shared.published()[0]);
    }
}
