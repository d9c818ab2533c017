use async_trait::async_trait;
use aws_sdk_sns::Client;
use aws_sdk_sns::error::SdkError;
use aws_sdk_sns::operation::publish::PublishError;
use aws_sdk_sns::types::MessageAttributeValue;
use tracing::debug;
use crate::core::events::DomainEvent;
use crate::core::library::{LibraryError, LibraryResult};
use crate::gateway::events::EventPublisher;

// SNSPublisher sends every event to one topic; subscribers filter on the `name`
// message attribute.
#[derive(Debug)]
pub struct SNSPublisher {
    client: Client,
    topic_arn: String,
}

impl SNSPublisher {
    pub(crate) fn new(client: Client, topic_arn: &str) -> Self {
        Self {
            client,
            topic_arn: topic_arn.to_string(),
        }
    }
}

#[async_trait]
impl EventPublisher for SNSPublisher {
    async fn publish(&self, event: &DomainEvent) -> LibraryResult<()> {
        let json = serde_json::to_string(event)?;
        let name = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(event.name.as_str())
            .build();
        let res = self.client
            .publish()
            .topic_arn(self.topic_arn.as_str())
            .message(json)
            .message_attributes("name", name)
            .send()
            .await?;
        debug!("published {} as {:?}", event.event_id, res.message_id());
        Ok(())
    }
}

impl From<SdkError<PublishError>> for LibraryError {
    fn from(err: SdkError<PublishError>) -> Self {
        LibraryError::unavailable(format!("{:?}", err).as_str(), None, true)
    }
}
