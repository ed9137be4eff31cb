use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while decoding a message payload.
#[derive(Error, Debug)]
pub enum MessageError {
    #[error("message data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("message data is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("message data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A Pub/Sub message as delivered to a topic trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// The payload, base64 encoded as on the wire.
    #[serde(default)]
    pub data: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering_key: Option<String>,
}

impl Message {
    /// Builds a message from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            ..Default::default()
        }
    }

    /// Builds a message whose payload is `value` serialized as JSON.
    pub fn from_json<T: Serialize>(value: &T) -> Result<Self, MessageError> {
        Ok(Self::from_bytes(&serde_json::to_vec(value)?))
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// The decoded payload bytes.
    pub fn bytes(&self) -> Result<Vec<u8>, MessageError> {
        Ok(STANDARD.decode(self.data.trim())?)
    }

    /// The decoded payload as UTF-8 text.
    pub fn text(&self) -> Result<String, MessageError> {
        Ok(String::from_utf8(self.bytes()?)?)
    }

    /// The decoded payload parsed as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, MessageError> {
        Ok(serde_json::from_slice(&self.bytes()?)?)
    }

    /// The message in the wire layout: `{ "data", "attributes" }`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "data": self.data,
            "attributes": self.attributes,
        })
    }
}
