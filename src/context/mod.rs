//! Event context translation.
//!
//! Every background function receives an [`EventContext`] next to its payload. The
//! context is built from the runtime's raw envelope by [`EventContext::from_raw`]:
//! the timestamp is parsed, wildcard parameters are copied into a string map and the
//! auth and resource fields are passed through.
//!
//! # Legacy auth
//!
//! Realtime Database events may carry auth in the older `{ "admin": .., "variable": .. }`
//! layout instead of an explicit `authType`. The translator derives the auth type and
//! the `uid`/`token` pair from it.

pub mod models;


pub use self::models::{AuthInfo, AuthType, RawContext, RawEvent, RawResource, Resource};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

const NAIVE_ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Errors raised while translating a raw event envelope.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The envelope timestamp is not an RFC 3339 / ISO-8601 date-time.
    #[error("invalid event timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// The envelope body is not valid JSON or has no usable context.
    #[error("invalid event envelope: {0}")]
    Envelope(#[from] serde_json::Error),
}

/// Metadata describing when, why and under what authorization an event occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct EventContext {
    pub auth: Option<AuthInfo>,
    pub auth_type: Option<AuthType>,
    pub event_id: String,
    pub event_type: String,
    pub params: HashMap<String, String>,
    pub resource: Option<Resource>,
    pub timestamp: DateTime<Utc>,
}

impl EventContext {
    /// Translates the context half of a raw envelope.
    pub fn from_raw(raw: &RawEvent) -> Result<Self, ParseError> {
        let context = &raw.context;
        let timestamp = parse_timestamp(&context.timestamp)?;
        let (auth, legacy_auth_type) = translate_auth(context.auth.as_ref());
        let auth_type = context
            .auth_type
            .as_deref()
            .and_then(AuthType::parse)
            .or(legacy_auth_type);

        Ok(Self {
            auth,
            auth_type,
            event_id: context.event_id.clone(),
            event_type: context.event_type.clone(),
            params: translate_params(context.params.as_ref()),
            resource: context.resource.clone().map(Resource::from),
            timestamp,
        })
    }

    /// The resource name, or an empty string when the envelope carried none.
    pub fn resource_name(&self) -> &str {
        self.resource.as_ref().map(|r| r.name.as_str()).unwrap_or("")
    }

    /// The timestamp formatted the way the runtime sends it.
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl RawEvent {
    /// Decodes an envelope in either the nested or the flat layout.
    pub fn from_slice(body: &[u8]) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    /// Decodes an already-parsed envelope in either the nested or the flat layout.
    pub fn from_value(mut value: Value) -> Result<Self, ParseError> {
        let nested = value
            .as_object()
            .map(|o| o.get("context").map_or(false, Value::is_object))
            .unwrap_or(false);

        if nested {
            return Ok(serde_json::from_value(value)?);
        }

        let data = value
            .as_object_mut()
            .and_then(|o| o.remove("data"))
            .unwrap_or(Value::Null);
        let context: RawContext = serde_json::from_value(value)?;
        Ok(Self { data, context })
    }
}

/// Parses an ISO-8601 timestamp into UTC. Timestamps without an offset are read as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|source| {
            NaiveDateTime::parse_from_str(value, NAIVE_ISO_FORMAT)
                .map(|naive| naive.and_utc())
                .map_err(|_| source)
        })
        .map_err(|source| ParseError::Timestamp {
            value: value.to_string(),
            source,
        })
}

fn translate_params(params: Option<&Value>) -> HashMap<String, String> {
    match params {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
        _ => HashMap::new(),
    }
}

fn translate_auth(auth: Option<&Value>) -> (Option<AuthInfo>, Option<AuthType>) {
    let Some(Value::Object(fields)) = auth else {
        return (None, None);
    };

    // Realtime Database layout: { admin: bool, variable: { uid, .. } | null }
    if fields.contains_key("admin") || fields.contains_key("variable") {
        if fields.get("admin").and_then(Value::as_bool).unwrap_or(false) {
            return (None, Some(AuthType::Admin));
        }
        return match fields.get("variable") {
            Some(Value::Object(variable)) => {
                let info = AuthInfo {
                    uid: variable.get("uid").and_then(Value::as_str).map(String::from),
                    token: variable.clone(),
                };
                (Some(info), Some(AuthType::User))
            }
            _ => (None, Some(AuthType::Unauthenticated)),
        };
    }

    let info = AuthInfo {
        uid: fields.get("uid").and_then(Value::as_str).map(String::from),
        token: fields
            .get("token")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
    };
    (Some(info), None)
}
