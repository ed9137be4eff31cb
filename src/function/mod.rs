//! Exportable function values.
//!
//! The registry accepts exactly two shapes: [`HttpsFunction`] and the generic event
//! driven [`CloudFunction`]. Trigger builders produce `CloudFunction`s by wrapping a
//! typed handler in an adapter that decodes the raw envelope, builds the
//! [`EventContext`] and converts the handler's [`Completion`] into an [`Outcome`].


use crate::completion::{Completion, Outcome};
use crate::context::{EventContext, ParseError, RawEvent};
use crate::https::HttpsFunction;
use crate::options::DeploymentOptions;
use crate::path::PathPattern;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised while adapting a raw event for a handler.
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error(transparent)]
    Context(#[from] ParseError),
    #[error("invalid payload for {event_type}: {source}")]
    Payload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid payload for {event_type}: {message}")]
    InvalidPayload { event_type: String, message: String },
}

impl TriggerError {
    pub(crate) fn payload(context: &EventContext, source: serde_json::Error) -> Self {
        TriggerError::Payload {
            event_type: context.event_type.clone(),
            source,
        }
    }

    pub(crate) fn invalid(context: &EventContext, message: impl Into<String>) -> Self {
        TriggerError::InvalidPayload {
            event_type: context.event_type.clone(),
            message: message.into(),
        }
    }
}

/// The event a background function listens to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTrigger {
    pub event_type: String,
    pub resource: String,
    pub service: String,
}

/// Cron schedule attached to a scheduled function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub schedule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<RetryConfig>,
}

/// Cloud Scheduler retry settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retry_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_backoff_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_backoff_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_doublings: Option<u32>,
}

/// Where wildcard parameters come from when the envelope carries none.
///
/// The concrete path is the part of the resource name after `marker`
/// (`/refs/` for the Realtime Database, `/documents/` for Firestore).
#[derive(Debug, Clone)]
pub(crate) struct ParamSource {
    pub(crate) pattern: PathPattern,
    pub(crate) marker: &'static str,
}

impl ParamSource {
    pub(crate) fn path_of<'a>(&self, resource_name: &'a str) -> Option<&'a str> {
        resource_name
            .find(self.marker)
            .map(|i| &resource_name[i + self.marker.len()..])
    }

    fn fill(&self, context: &mut EventContext) {
        if !context.params.is_empty() || !self.pattern.has_wildcards() {
            return;
        }
        if let Some(path) = self.path_of(context.resource_name()) {
            context.params = self.pattern.extract_matches(path);
        }
    }
}

type EventAdapter = Arc<dyn Fn(RawEvent) -> Result<Outcome, TriggerError> + Send + Sync>;

/// Wraps a typed handler into the adapter shape the runtime calls.
pub(crate) fn adapt<P, D, H, C>(params: Option<ParamSource>, decode: D, handler: H) -> EventAdapter
where
    D: Fn(&RawEvent, &EventContext) -> Result<P, TriggerError> + Send + Sync + 'static,
    H: Fn(P, EventContext) -> C + Send + Sync + 'static,
    C: Into<Completion>,
{
    Arc::new(move |raw: RawEvent| {
        let mut context = EventContext::from_raw(&raw)?;
        if let Some(source) = &params {
            source.fill(&mut context);
        }
        let payload = decode(&raw, &context)?;
        let completion: Completion = handler(payload, context).into();
        Ok(completion.into_outcome())
    })
}

/// A background function triggered by a cloud event.
#[derive(Clone)]
pub struct CloudFunction {
    trigger: EventTrigger,
    options: DeploymentOptions,
    schedule: Option<Schedule>,
    adapter: EventAdapter,
}

impl CloudFunction {
    pub(crate) fn new(trigger: EventTrigger, options: DeploymentOptions, adapter: EventAdapter) -> Self {
        Self {
            trigger,
            options,
            schedule: None,
            adapter,
        }
    }

    pub(crate) fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn trigger(&self) -> &EventTrigger {
        &self.trigger
    }

    pub fn options(&self) -> &DeploymentOptions {
        &self.options
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    /// Runs the adapter for one raw event.
    ///
    /// Handler failures are not caught here: they surface when the returned
    /// [`Outcome`] is settled.
    pub fn run(&self, raw: RawEvent) -> Result<Outcome, TriggerError> {
        debug!(
            event_id = %raw.context.event_id,
            event_type = %raw.context.event_type,
            "dispatching event"
        );
        (self.adapter)(raw)
    }

    /// Checks the trigger is deployable under `key`.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.trigger.event_type.is_empty() {
            return Err("event type is empty".to_string());
        }
        if self.trigger.resource.is_empty() {
            return Err("resource is empty".to_string());
        }
        if self.trigger.service == crate::pubsub::PUBSUB_SERVICE && self.schedule.is_none() {
            let topic = self.trigger.resource.rsplit("/topics/").next().unwrap_or("");
            if topic.is_empty() || topic.contains('/') {
                return Err(format!("invalid topic name '{}'", topic));
            }
        }
        if let Some(schedule) = &self.schedule {
            if schedule.schedule.trim().is_empty() {
                return Err("schedule expression is empty".to_string());
            }
        }
        Ok(())
    }

    /// Scheduled functions publish to a topic derived from their export name.
    pub(crate) fn bind_export_name(&mut self, key: &str) {
        if self.schedule.is_some() {
            self.trigger.resource = crate::pubsub::schedule_topic_resource(key, self.options.primary_region());
        }
    }
}

impl fmt::Debug for CloudFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudFunction")
            .field("trigger", &self.trigger)
            .field("options", &self.options)
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

/// One of the two exportable function shapes.
#[derive(Debug, Clone)]
pub enum Function {
    Https(HttpsFunction),
    Event(CloudFunction),
}

impl Function {
    pub fn options(&self) -> &DeploymentOptions {
        match self {
            Function::Https(f) => f.options(),
            Function::Event(f) => f.options(),
        }
    }

    pub fn as_event(&self) -> Option<&CloudFunction> {
        match self {
            Function::Event(f) => Some(f),
            Function::Https(_) => None,
        }
    }

    pub fn as_https(&self) -> Option<&HttpsFunction> {
        match self {
            Function::Https(f) => Some(f),
            Function::Event(_) => None,
        }
    }
}

impl From<HttpsFunction> for Function {
    fn from(f: HttpsFunction) -> Self {
        Function::Https(f)
    }
}

impl From<CloudFunction> for Function {
    fn from(f: CloudFunction) -> Self {
        Function::Event(f)
    }
}
