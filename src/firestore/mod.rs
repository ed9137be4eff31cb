//! Cloud Firestore triggers.
//!
//! Document events carry the old and new document in Firestore's REST value encoding
//! (`stringValue`, `integerValue`, `mapValue`, ...). [`DocumentSnapshot`] decodes them
//! into plain JSON or any `DeserializeOwned` type on demand.
//!
//! ```rust
//! use firebase_functions::completion::Completion;
//! use firebase_functions::firestore;
//!
//! let audit = firestore::document("orders/{orderId}").on_update(|change, context| {
//!     let order_id = context.params["orderId"].clone();
//!     let status: Option<String> = change.after.get("status").ok().flatten();
//!     tracing::info!(%order_id, ?status, "order updated");
//!     Completion::Done
//! });
//! # let _ = audit;
//! ```

pub mod models;
pub mod snapshot;


pub use self::models::{Document, DocumentMask};
pub use self::snapshot::DocumentSnapshot;

use self::models::DocumentEventData;
use crate::change::Change;
use crate::completion::Completion;
use crate::context::{EventContext, RawEvent};
use crate::function::{adapt, CloudFunction, EventTrigger, ParamSource, TriggerError};
use crate::options::DeploymentOptions;
use crate::path::PathPattern;
use thiserror::Error;

pub(crate) const FIRESTORE_SERVICE: &str = "firestore.googleapis.com";
const EVENT_PREFIX: &str = "providers/cloud.firestore/eventTypes/";
const DEFAULT_DATABASE: &str = "(default)";

/// Errors that can occur while reading document snapshots.
#[derive(Error, Debug)]
pub enum FirestoreError {
    /// Wrapper for `serde_json::Error`.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    /// A value in the document could not be decoded.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Starts a trigger on a document path. Segments like `{docId}` are wildcards.
pub fn document(path: &str) -> DocumentBuilder {
    DocumentBuilder::new(path, DeploymentOptions::default())
}

/// Builder for Cloud Firestore document triggers.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    pattern: PathPattern,
    database: String,
    options: DeploymentOptions,
}

impl DocumentBuilder {
    pub(crate) fn new(path: &str, options: DeploymentOptions) -> Self {
        Self {
            pattern: PathPattern::new(path),
            database: DEFAULT_DATABASE.to_string(),
            options,
        }
    }

    /// Listens on a named database instead of `(default)`.
    pub fn database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    fn resource(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents/{}",
            crate::config::project_id().unwrap_or_else(|| "_".to_string()),
            self.database,
            self.pattern.value()
        )
    }

    fn build<P, D, H, C>(&self, action: &str, decode: D, handler: H) -> CloudFunction
    where
        D: Fn(&RawEvent, &EventContext) -> Result<P, TriggerError> + Send + Sync + 'static,
        H: Fn(P, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        let trigger = EventTrigger {
            event_type: format!("{}document.{}", EVENT_PREFIX, action),
            resource: self.resource(),
            service: FIRESTORE_SERVICE.to_string(),
        };
        let params = ParamSource {
            pattern: self.pattern.clone(),
            marker: "/documents/",
        };
        CloudFunction::new(trigger, self.options.clone(), adapt(Some(params), decode, handler))
    }

    /// Fires when a document is created. The handler receives the new document.
    pub fn on_create<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(DocumentSnapshot, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("create", |raw, ctx| decode_change(raw, ctx).map(|c| c.after), handler)
    }

    /// Fires when a document is deleted. The handler receives the deleted document.
    pub fn on_delete<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(DocumentSnapshot, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("delete", |raw, ctx| decode_change(raw, ctx).map(|c| c.before), handler)
    }

    /// Fires when an existing document changes.
    pub fn on_update<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(Change<DocumentSnapshot>, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("update", decode_change, handler)
    }

    /// Fires on any create, update or delete.
    pub fn on_write<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(Change<DocumentSnapshot>, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("write", decode_change, handler)
    }
}

fn document_path(resource: &str) -> &str {
    resource
        .split_once("/documents/")
        .map(|(_, path)| path)
        .unwrap_or("")
}

fn decode_change(
    raw: &RawEvent,
    context: &EventContext,
) -> Result<Change<DocumentSnapshot>, TriggerError> {
    let data: DocumentEventData = if raw.data.is_null() {
        DocumentEventData::default()
    } else {
        serde_json::from_value(raw.data.clone()).map_err(|e| TriggerError::payload(context, e))?
    };

    let path = document_path(context.resource_name());
    let read_time = Some(context.timestamp);
    Ok(Change::new(
        DocumentSnapshot::new(path, data.old_value, read_time),
        DocumentSnapshot::new(path, data.value, read_time),
    ))
}
