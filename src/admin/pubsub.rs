//! Pub/Sub publisher.

use crate::core::middleware::AuthMiddleware;
use crate::core::parse_error_response;
use crate::pubsub::Message;
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

const PUBSUB_BASE_URL: &str = "https://pubsub.googleapis.com/v1";

#[derive(Error, Debug)]
pub enum PubSubError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("invalid topic name '{0}'")]
    InvalidTopic(String),
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    messages: [&'a Message; 1],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

#[derive(Clone)]
pub struct PubSub {
    client: ClientWithMiddleware,
    base_url: String,
    project_id: String,
}

impl PubSub {
    pub fn new(middleware: AuthMiddleware, project_id: &str) -> Self {
        Self::new_with_client(super::retrying_client(Some(middleware)), PUBSUB_BASE_URL, project_id)
    }

    pub fn new_with_client(client: ClientWithMiddleware, base_url: &str, project_id: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
        }
    }

    /// A topic of this project, by short name.
    pub fn topic(&self, name: &str) -> Topic {
        Topic {
            pubsub: self.clone(),
            name: name.to_string(),
        }
    }
}

/// A topic messages can be published to.
#[derive(Clone)]
pub struct Topic {
    pubsub: PubSub,
    name: String,
}

impl Topic {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `projects/{project}/topics/{name}`
    pub fn resource_name(&self) -> String {
        format!("projects/{}/topics/{}", self.pubsub.project_id, self.name)
    }

    /// Publishes `value` serialized as JSON and returns the message id.
    pub async fn publish_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, PubSubError> {
        let data = serde_json::to_vec(value)?;
        self.publish(&data, HashMap::new()).await
    }

    /// Publishes raw bytes with attributes and returns the message id.
    pub async fn publish(&self, data: &[u8], attributes: HashMap<String, String>) -> Result<String, PubSubError> {
        let mut message = Message::from_bytes(data);
        message.attributes = attributes;
        self.publish_message(&message).await
    }

    /// Publishes a prepared message and returns the message id.
    pub async fn publish_message(&self, message: &Message) -> Result<String, PubSubError> {
        if self.name.is_empty() || self.name.contains('/') {
            return Err(PubSubError::InvalidTopic(self.name.clone()));
        }
        let url = format!("{}/{}:publish", self.pubsub.base_url, self.resource_name());
        debug!(topic = %self.name, "publishing message");

        let response = self
            .pubsub
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&PublishRequest { messages: [message] })?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PubSubError::ApiError(
                parse_error_response(response, "Publish failed").await,
            ));
        }

        let published: PublishResponse = response.json().await?;
        published
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| PubSubError::ApiError("Publish returned no message id".to_string()))
    }
}
