use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A raw event as delivered by the Cloud Functions runtime.
///
/// The runtime posts one of two envelope layouts: the nested form
/// `{ "data": .., "context": { .. } }` and the older flat form where the
/// context fields sit next to `data`. Both decode into this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawEvent {
    #[serde(default)]
    pub data: Value,
    pub context: RawContext,
}

/// The context half of a raw event envelope, before any validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawContext {
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<RawResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
}

/// Older runtimes send the resource as a bare name; newer ones as an object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawResource {
    Name(String),
    Descriptor(Resource),
}

impl From<RawResource> for Resource {
    fn from(raw: RawResource) -> Self {
        match raw {
            RawResource::Name(name) => Resource {
                name,
                ..Default::default()
            },
            RawResource::Descriptor(resource) => resource,
        }
    }
}

/// The resource that emitted an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
}

/// Authentication information for the user that triggered the event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthInfo {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub token: Map<String, Value>,
}

/// The authorization level of the principal that triggered the event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthType {
    Admin,
    User,
    Unauthenticated,
}

impl AuthType {
    /// Parses the runtime's `authType` string. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "ADMIN" => Some(AuthType::Admin),
            "USER" => Some(AuthType::User),
            "UNAUTHENTICATED" => Some(AuthType::Unauthenticated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::Admin => "ADMIN",
            AuthType::User => "USER",
            AuthType::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}
