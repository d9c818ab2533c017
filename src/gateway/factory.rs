use tracing::warn;
use crate::core::domain::Configuration;
use crate::core::repository::StoreHandle;
use crate::gateway::ddb::publisher::DDBPublisher;
use crate::gateway::events::EventPublisher;
use crate::gateway::GatewayPublisherVia;
use crate::gateway::logs::LogPublisher;
use crate::gateway::sns::publisher::SNSPublisher;
use crate::utils::ddb::{build_sns_client, EVENTS_TABLE};

pub async fn create_publisher(config: &Configuration, handle: &StoreHandle) -> Box<dyn EventPublisher> {
    match (handle.store().gateway_publisher(), handle) {
        (GatewayPublisherVia::Sns, _) => {
            match config.events_topic_arn.as_deref() {
                Some(topic_arn) => {
                    let client = build_sns_client().await;
                    Box::new(SNSPublisher::new(client, topic_arn))
                }
                None => {
                    warn!("events_topic_arn is not configured, events are only logged");
                    Box::new(LogPublisher::new())
                }
            }
        }
        (GatewayPublisherVia::LocalDynamoDB, StoreHandle::DynamoDB { client, .. }) => {
            Box::new(DDBPublisher::new(client.clone(), EVENTS_TABLE))
        }
        _ => {
            Box::new(LogPublisher::new())
        }
    }
}
