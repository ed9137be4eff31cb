//! Realtime Database triggers.
//!
//! ```rust
//! use firebase_functions::completion::Completion;
//! use firebase_functions::database;
//!
//! let on_new_user = database::reference("/users/{uid}").on_create(|snapshot, context| {
//!     let uid = context.params.get("uid").cloned().unwrap_or_default();
//!     tracing::info!(%uid, exists = snapshot.exists(), "user created");
//!     Completion::Done
//! });
//! # let _ = on_new_user;
//! ```
//!
//! The runtime delivers `{ "data": <before>, "delta": <changes> }`; the `after`
//! snapshot is computed by applying the delta to the data stored before the event.

pub mod snapshot;

#[cfg(test)]
mod tests;

pub use self::snapshot::DataSnapshot;

use self::snapshot::apply_delta;
use crate::change::Change;
use crate::completion::Completion;
use crate::config::FirebaseConfig;
use crate::context::{EventContext, RawEvent};
use crate::function::{adapt, CloudFunction, EventTrigger, ParamSource, TriggerError};
use crate::options::DeploymentOptions;
use crate::path::PathPattern;
use serde_json::Value;
use tracing::warn;

pub(crate) const DATABASE_SERVICE: &str = "firebaseio.com";
const EVENT_PREFIX: &str = "providers/google.firebase.database/eventTypes/";
const DEFAULT_INSTANCE: &str = "_";

/// The instance name of a database URL, e.g. `demo-default-rtdb` for
/// `https://demo-default-rtdb.firebaseio.com`.
fn instance_of_url(url: &str) -> Option<String> {
    let host = url.split_once("://").map_or(url, |(_, rest)| rest);
    host.split(['/', ':', '.'])
        .next()
        .filter(|name| !name.is_empty())
        .map(String::from)
}

/// The instance a trigger listens on when none is named: the project's default
/// database, or `_` when no project is known.
pub(crate) fn instance_from_config(config: Option<&FirebaseConfig>) -> String {
    config
        .and_then(FirebaseConfig::default_database_url)
        .and_then(|url| instance_of_url(&url))
        .unwrap_or_else(|| DEFAULT_INSTANCE.to_string())
}

fn default_instance() -> String {
    match FirebaseConfig::from_env() {
        Ok(config) => instance_from_config(config.as_ref()),
        Err(e) => {
            warn!(error = %e, "could not read FIREBASE_CONFIG for the default database");
            DEFAULT_INSTANCE.to_string()
        }
    }
}

/// Starts a trigger on a database reference. Segments like `{uid}` are wildcards.
pub fn reference(path: &str) -> RefBuilder {
    RefBuilder::new(path, DeploymentOptions::default())
}

/// Builder for Realtime Database triggers.
#[derive(Debug, Clone)]
pub struct RefBuilder {
    pattern: PathPattern,
    instance: Option<String>,
    options: DeploymentOptions,
}

impl RefBuilder {
    pub(crate) fn new(path: &str, options: DeploymentOptions) -> Self {
        Self {
            pattern: PathPattern::new(path),
            instance: None,
            options,
        }
    }

    /// Listens on a specific database instance instead of the default one.
    pub fn instance(mut self, instance: &str) -> Self {
        self.instance = Some(instance.to_string());
        self
    }

    fn resource(&self) -> String {
        let instance = match &self.instance {
            Some(instance) => instance.clone(),
            None => default_instance(),
        };
        self.resource_on(&instance)
    }

    fn resource_on(&self, instance: &str) -> String {
        format!("projects/_/instances/{}/refs/{}", instance, self.pattern.value())
    }

    fn trigger(&self, action: &str) -> EventTrigger {
        EventTrigger {
            event_type: format!("{}ref.{}", EVENT_PREFIX, action),
            resource: self.resource(),
            service: DATABASE_SERVICE.to_string(),
        }
    }

    fn params(&self) -> Option<ParamSource> {
        Some(ParamSource {
            pattern: self.pattern.clone(),
            marker: "/refs/",
        })
    }

    fn build<P, D, H, C>(&self, action: &str, decode: D, handler: H) -> CloudFunction
    where
        D: Fn(&RawEvent, &EventContext) -> Result<P, TriggerError> + Send + Sync + 'static,
        H: Fn(P, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        CloudFunction::new(
            self.trigger(action),
            self.options.clone(),
            adapt(self.params(), decode, handler),
        )
    }

    /// Fires when data is created. The handler receives the new data.
    pub fn on_create<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(DataSnapshot, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("create", |raw, ctx| decode_change(raw, ctx).map(|c| c.after), handler)
    }

    /// Fires when data is deleted. The handler receives the deleted data.
    pub fn on_delete<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(DataSnapshot, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("delete", |raw, ctx| decode_change(raw, ctx).map(|c| c.before), handler)
    }

    /// Fires when existing data changes.
    pub fn on_update<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(Change<DataSnapshot>, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("update", decode_change, handler)
    }

    /// Fires on any create, update or delete.
    pub fn on_write<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(Change<DataSnapshot>, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("write", decode_change, handler)
    }
}

/// Splits a resource name into its instance and ref path.
fn parse_resource(resource: &str) -> (Option<String>, String) {
    let instance = resource
        .split("/instances/")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .filter(|s| !s.is_empty() && *s != DEFAULT_INSTANCE)
        .map(String::from);
    let path = resource
        .split_once("/refs/")
        .map(|(_, p)| p.to_string())
        .unwrap_or_default();
    (instance, path)
}

fn decode_change(raw: &RawEvent, context: &EventContext) -> Result<Change<DataSnapshot>, TriggerError> {
    let (before, delta) = match &raw.data {
        Value::Object(fields) => (
            fields.get("data").cloned().unwrap_or(Value::Null),
            fields.get("delta").cloned().unwrap_or(Value::Null),
        ),
        Value::Null => (Value::Null, Value::Null),
        _ => {
            return Err(TriggerError::invalid(
                context,
                "expected an object with 'data' and 'delta'",
            ))
        }
    };

    let after = apply_delta(&before, &delta);
    let (instance, path) = parse_resource(context.resource_name());

    Ok(Change::new(
        DataSnapshot::new(instance.clone(), &path, before),
        DataSnapshot::new(instance, &path, after),
    ))
}
