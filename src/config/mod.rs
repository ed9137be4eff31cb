//! Function configuration.
//!
//! [`Config`] holds the namespaced values set with `firebase functions:config:set` and
//! answers dotted-key lookups such as `config.get("stripe.key")`. The values are read
//! once from the runtime environment:
//!
//! * `CLOUD_RUNTIME_CONFIG`: inline JSON when it starts with `{`, otherwise a file path.
//! * `.runtimeconfig.json` in the working directory, used by the emulator.
//!
//! `FIREBASE_CONFIG` is parsed into [`FirebaseConfig`] and also exposed under the
//! `firebase` namespace.

#[cfg(test)]
mod tests;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const RUNTIME_CONFIG_ENV: &str = "CLOUD_RUNTIME_CONFIG";
const FIREBASE_CONFIG_ENV: &str = "FIREBASE_CONFIG";
const RUNTIME_CONFIG_FILE: &str = ".runtimeconfig.json";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON from {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("config root must be a JSON object (from {0})")]
    NotAnObject(String),
}

/// Project-level settings from `FIREBASE_CONFIG`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(rename = "databaseURL", default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
}

impl FirebaseConfig {
    /// Reads `FIREBASE_CONFIG`, filling the project id from `GCLOUD_PROJECT` or
    /// `GOOGLE_CLOUD_PROJECT` when it is missing.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let mut config = match env::var(FIREBASE_CONFIG_ENV) {
            Ok(source) => Some(load_source::<FirebaseConfig>(&source, FIREBASE_CONFIG_ENV)?),
            Err(_) => None,
        };

        if let Some(project) = env_project_id() {
            let config = config.get_or_insert_with(FirebaseConfig::default);
            if config.project_id.is_none() {
                config.project_id = Some(project);
            }
        }
        Ok(config)
    }

    /// The default Storage bucket, falling back to `{project}.appspot.com`.
    pub fn default_bucket(&self) -> Option<String> {
        self.storage_bucket.clone().or_else(|| {
            self.project_id
                .as_ref()
                .map(|project| format!("{}.appspot.com", project))
        })
    }

    /// The default Realtime Database URL, falling back to the `-default-rtdb` instance.
    pub fn default_database_url(&self) -> Option<String> {
        self.database_url.clone().or_else(|| {
            self.project_id
                .as_ref()
                .map(|project| format!("https://{}-default-rtdb.firebaseio.com", project))
        })
    }
}

fn env_project_id() -> Option<String> {
    ["GCLOUD_PROJECT", "GOOGLE_CLOUD_PROJECT"]
        .iter()
        .find_map(|name| env::var(name).ok().filter(|v| !v.is_empty()))
}

/// The project id from the runtime environment, if any.
pub fn project_id() -> Option<String> {
    match FirebaseConfig::from_env() {
        Ok(Some(config)) => config.project_id,
        Ok(None) => None,
        Err(e) => {
            debug!(error = %e, "ignoring unreadable FIREBASE_CONFIG");
            env_project_id()
        }
    }
}

/// Read-only function configuration with dotted-key lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    values: Value,
    firebase: Option<FirebaseConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            values: Value::Object(Map::new()),
            firebase: None,
        }
    }
}

impl Config {
    /// Wraps an already-loaded configuration object.
    pub fn new(values: Value) -> Self {
        Self {
            values,
            firebase: None,
        }
    }

    /// Loads configuration from the runtime environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let runtime = env::var(RUNTIME_CONFIG_ENV).ok();
        let cwd = env::current_dir().ok();
        let mut config = Self::load(runtime.as_deref(), cwd.as_deref())?;
        if let Some(firebase) = FirebaseConfig::from_env()? {
            config = config.with_firebase(firebase);
        }
        Ok(config)
    }

    /// Loads from an explicit `CLOUD_RUNTIME_CONFIG` value, falling back to
    /// `.runtimeconfig.json` in `dir`. Missing sources give an empty config.
    pub fn load(runtime_config: Option<&str>, dir: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(source) = runtime_config.filter(|s| !s.trim().is_empty()) {
            let values: Value = load_source(source, RUNTIME_CONFIG_ENV)?;
            return Self::checked(values, RUNTIME_CONFIG_ENV);
        }

        if let Some(dir) = dir {
            let path = dir.join(RUNTIME_CONFIG_FILE);
            if path.is_file() {
                let values: Value = read_file(&path)?;
                return Self::checked(values, &path.display().to_string());
            }
        }

        debug!("no runtime config found, using an empty config");
        Ok(Self::default())
    }

    fn checked(values: Value, origin: &str) -> Result<Self, ConfigError> {
        if values.is_object() {
            Ok(Self::new(values))
        } else {
            Err(ConfigError::NotAnObject(origin.to_string()))
        }
    }

    /// Attaches project settings, also exposing them under the `firebase` namespace
    /// unless the runtime config already defines one.
    pub fn with_firebase(mut self, firebase: FirebaseConfig) -> Self {
        if let Value::Object(map) = &mut self.values {
            if !map.contains_key("firebase") {
                if let Ok(value) = serde_json::to_value(&firebase) {
                    map.insert("firebase".to_string(), value);
                }
            }
        }
        self.firebase = Some(firebase);
        self
    }

    pub fn firebase(&self) -> Option<&FirebaseConfig> {
        self.firebase.as_ref()
    }

    /// Looks up a dotted key such as `service.api.key`.
    ///
    /// Returns `None` as soon as a segment is missing or the value reached so far is
    /// not an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.values, |current, segment| current.as_object()?.get(segment))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Looks up a dotted key and deserializes the value.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|source| ConfigError::Json {
                    origin: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// The whole configuration object.
    pub fn as_value(&self) -> &Value {
        &self.values
    }
}

fn load_source<T: DeserializeOwned>(source: &str, origin: &str) -> Result<T, ConfigError> {
    if source.trim_start().starts_with('{') {
        serde_json::from_str(source).map_err(|source| ConfigError::Json {
            origin: origin.to_string(),
            source,
        })
    } else {
        read_file(Path::new(source.trim()))
    }
}

fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        origin: path.display().to_string(),
        source,
    })
}
