//! The export registry.
//!
//! A [`Registry`] maps export names to functions. It is filled once at startup and
//! then shared read-only with the runtime server:
//!
//! ```rust
//! use firebase_functions::completion::Completion;
//! use firebase_functions::registry::Registry;
//! use firebase_functions::{database, pubsub};
//!
//! let mut registry = Registry::new();
//! registry
//!     .register("onUserWrite", database::reference("/users/{uid}").on_write(|_change, _ctx| Completion::Done))
//!     .unwrap();
//! registry
//!     .register("nightly", pubsub::schedule("every day 03:00").on_run(|_ctx| Completion::Done))
//!     .unwrap();
//! assert_eq!(registry.len(), 2);
//! ```

pub mod manifest;

#[cfg(test)]
mod tests;

pub use self::manifest::{Endpoint, HttpsTrigger, Manifest, MANIFEST_SPEC_VERSION};

use crate::completion::Outcome;
use crate::context::RawEvent;
use crate::function::{CloudFunction, Function, TriggerError};
use crate::https::HttpsFunction;
use std::any::Any;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

const MAX_KEY_LEN: usize = 63;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid export name '{0}': must start with a letter, contain only letters, digits, '-' or '_', and be at most 63 characters")]
    InvalidKey(String),
    #[error("'{0}' is not an exportable function (expected an HttpsFunction or a CloudFunction)")]
    InvalidShape(String),
    #[error("invalid trigger for '{key}': {reason}")]
    InvalidTrigger { key: String, reason: String },
    #[error("no function registered as '{0}'")]
    UnknownFunction(String),
    #[error("'{0}' is an HTTPS function and does not accept events")]
    NotAnEventFunction(String),
    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

fn validate_key(key: &str) -> Result<(), RegistryError> {
    let mut chars = key.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid = starts_with_letter
        && key.len() <= MAX_KEY_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidKey(key.to_string()))
    }
}

/// Export name to function map.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    functions: BTreeMap<String, Function>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `function` under `key`.
    ///
    /// A function already registered under the same key is replaced.
    pub fn register(&mut self, key: &str, function: impl Into<Function>) -> Result<(), RegistryError> {
        validate_key(key)?;
        let mut function = function.into();
        if let Function::Event(event) = &mut function {
            event
                .validate()
                .map_err(|reason| RegistryError::InvalidTrigger {
                    key: key.to_string(),
                    reason,
                })?;
            event.bind_export_name(key);
        }

        debug!(function = key, "registered function");
        if self.functions.insert(key.to_string(), function).is_some() {
            warn!(function = key, "replaced a previously registered function");
        }
        Ok(())
    }

    /// Registers a dynamically typed value, failing unless it is an exportable function.
    pub fn register_any(&mut self, key: &str, value: Box<dyn Any + Send + Sync>) -> Result<(), RegistryError> {
        let value = match value.downcast::<CloudFunction>() {
            Ok(function) => return self.register(key, *function),
            Err(value) => value,
        };
        let value = match value.downcast::<HttpsFunction>() {
            Ok(function) => return self.register(key, *function),
            Err(value) => value,
        };
        match value.downcast::<Function>() {
            Ok(function) => self.register(key, *function),
            Err(_) => Err(RegistryError::InvalidShape(key.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Function> {
        self.functions.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.functions.contains_key(key)
    }

    /// Export names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Function)> {
        self.functions.iter().map(|(k, f)| (k.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Runs the event function registered under `key`.
    pub fn dispatch_event(&self, key: &str, raw: RawEvent) -> Result<Outcome, RegistryError> {
        match self.functions.get(key) {
            Some(Function::Event(function)) => Ok(function.run(raw)?),
            Some(Function::Https(_)) => Err(RegistryError::NotAnEventFunction(key.to_string())),
            None => Err(RegistryError::UnknownFunction(key.to_string())),
        }
    }

    /// Builds the deploy manifest for every registered function.
    pub fn manifest(&self) -> Manifest {
        let endpoints = self
            .functions
            .iter()
            .map(|(key, function)| {
                let options = function.options();
                let runtime = &options.runtime;
                let mut endpoint = Endpoint {
                    entry_point: key.clone(),
                    platform: "gcfv1".to_string(),
                    region: options.effective_regions(),
                    available_memory_mb: runtime.memory.map(|m| m.megabytes()),
                    timeout_seconds: runtime.timeout_seconds,
                    min_instances: runtime.min_instances,
                    max_instances: runtime.max_instances,
                    https_trigger: None,
                    event_trigger: None,
                    schedule: None,
                };
                match function {
                    Function::Https(_) => endpoint.https_trigger = Some(HttpsTrigger::default()),
                    Function::Event(event) => {
                        endpoint.event_trigger = Some(event.trigger().clone());
                        endpoint.schedule = event.schedule().cloned();
                    }
                }
                (key.clone(), endpoint)
            })
            .collect();

        Manifest {
            spec_version: MANIFEST_SPEC_VERSION.to_string(),
            endpoints,
        }
    }
}
