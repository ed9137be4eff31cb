//! Cloud Storage triggers.
//!
//! Object events deliver the object's [`ObjectMetadata`]. Triggers listen on a named
//! bucket or, with [`object()`], on the project's default bucket.
//!
//! # Examples
//!
//! ```rust
//! use firebase_functions::completion::Completion;
//! use firebase_functions::storage;
//!
//! let thumbnails = storage::bucket("uploads.example.com")
//!     .object()
//!     .on_finalize(|object, _context| {
//!         tracing::info!(name = ?object.name, size = ?object.size_bytes(), "uploaded");
//!         Completion::Done
//!     });
//! # let _ = thumbnails;
//! ```

pub mod models;


pub use self::models::ObjectMetadata;

use crate::completion::Completion;
use crate::config::FirebaseConfig;
use crate::context::{EventContext, RawEvent};
use crate::function::{adapt, CloudFunction, EventTrigger, TriggerError};
use crate::options::DeploymentOptions;
use tracing::warn;

pub(crate) const STORAGE_SERVICE: &str = "storage.googleapis.com";
const EVENT_PREFIX: &str = "google.storage.object.";

/// Starts a trigger on a named bucket.
pub fn bucket(name: &str) -> BucketBuilder {
    BucketBuilder::new(Some(name), DeploymentOptions::default())
}

/// Starts an object trigger on the project's default bucket.
pub fn object() -> ObjectBuilder {
    BucketBuilder::new(None, DeploymentOptions::default()).object()
}

fn default_bucket() -> String {
    match FirebaseConfig::from_env() {
        Ok(Some(config)) => config.default_bucket(),
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "could not read FIREBASE_CONFIG for the default bucket");
            None
        }
    }
    .unwrap_or_else(|| "_".to_string())
}

/// Builder selecting the bucket a Storage trigger listens on.
#[derive(Debug, Clone)]
pub struct BucketBuilder {
    name: String,
    options: DeploymentOptions,
}

impl BucketBuilder {
    pub(crate) fn new(name: Option<&str>, options: DeploymentOptions) -> Self {
        let name = match name {
            Some(n) => n.to_string(),
            None => default_bucket(),
        };
        Self { name, options }
    }

    /// Returns the name of the bucket.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self) -> ObjectBuilder {
        ObjectBuilder {
            bucket: self.name.clone(),
            options: self.options.clone(),
        }
    }
}

/// Builder for Storage object triggers.
#[derive(Debug, Clone)]
pub struct ObjectBuilder {
    bucket: String,
    options: DeploymentOptions,
}

impl ObjectBuilder {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn build<H, C>(&self, action: &str, handler: H) -> CloudFunction
    where
        H: Fn(ObjectMetadata, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        let trigger = EventTrigger {
            event_type: format!("{}{}", EVENT_PREFIX, action),
            resource: format!("projects/_/buckets/{}", self.bucket),
            service: STORAGE_SERVICE.to_string(),
        };
        CloudFunction::new(trigger, self.options.clone(), adapt(None, decode_object, handler))
    }

    /// Fires when a new object (or a new generation of an existing one) is written.
    pub fn on_finalize<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(ObjectMetadata, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("finalize", handler)
    }

    /// Fires when an object is permanently deleted.
    pub fn on_delete<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(ObjectMetadata, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("delete", handler)
    }

    /// Fires when the live version of an object becomes noncurrent.
    pub fn on_archive<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(ObjectMetadata, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("archive", handler)
    }

    /// Fires when the metadata of an existing object changes.
    pub fn on_metadata_update<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(ObjectMetadata, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("metadataUpdate", handler)
    }
}

fn decode_object(raw: &RawEvent, context: &EventContext) -> Result<ObjectMetadata, TriggerError> {
    if !raw.data.is_object() {
        return Err(TriggerError::invalid(context, "expected object metadata"));
    }
    serde_json::from_value(raw.data.clone()).map_err(|e| TriggerError::payload(context, e))
}
