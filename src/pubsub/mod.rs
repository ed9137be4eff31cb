//! Pub/Sub topic triggers and scheduled functions.
//!
//! ```rust
//! use firebase_functions::completion::Completion;
//! use firebase_functions::pubsub;
//!
//! let on_publish = pubsub::topic("events").on_publish(|message, _context| {
//!     let text = message.text().unwrap_or_default();
//!     tracing::info!(%text, "received");
//!     Completion::Done
//! });
//!
//! let nightly = pubsub::schedule("every day 03:00")
//!     .time_zone("Europe/Paris")
//!     .on_run(|_context| Completion::Done);
//! # let _ = (on_publish, nightly);
//! ```
//!
//! A scheduled function is a topic trigger on `firebase-schedule-{name}-{region}`.
//! The topic depends on the export name, so it is resolved when the function is
//! registered.

pub mod message;


pub use self::message::{Message, MessageError};

use crate::completion::Completion;
use crate::context::{EventContext, RawEvent};
use crate::function::{adapt, CloudFunction, EventTrigger, RetryConfig, Schedule, TriggerError};
use crate::options::DeploymentOptions;
use serde_json::Value;

pub(crate) const PUBSUB_SERVICE: &str = "pubsub.googleapis.com";
const PUBLISH_EVENT: &str = "google.pubsub.topic.publish";

fn topic_resource(topic: &str) -> String {
    format!(
        "projects/{}/topics/{}",
        crate::config::project_id().unwrap_or_else(|| "_".to_string()),
        topic
    )
}

pub(crate) fn schedule_topic_resource(export_name: &str, region: &str) -> String {
    topic_resource(&format!("firebase-schedule-{}-{}", export_name, region))
}

/// Starts a trigger on a Pub/Sub topic.
pub fn topic(name: &str) -> TopicBuilder {
    TopicBuilder::new(name, DeploymentOptions::default())
}

/// Starts a scheduled function. Accepts cron or App Engine `every ...` syntax.
pub fn schedule(expression: &str) -> ScheduleBuilder {
    ScheduleBuilder::new(expression, DeploymentOptions::default())
}

/// Builder for Pub/Sub topic triggers.
#[derive(Debug, Clone)]
pub struct TopicBuilder {
    topic: String,
    options: DeploymentOptions,
}

impl TopicBuilder {
    pub(crate) fn new(topic: &str, options: DeploymentOptions) -> Self {
        Self {
            topic: topic.to_string(),
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.topic
    }

    /// Fires for every message published to the topic.
    pub fn on_publish<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(Message, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        let trigger = EventTrigger {
            event_type: PUBLISH_EVENT.to_string(),
            resource: topic_resource(&self.topic),
            service: PUBSUB_SERVICE.to_string(),
        };
        CloudFunction::new(trigger, self.options.clone(), adapt(None, decode_message, handler))
    }
}

fn decode_message(raw: &RawEvent, context: &EventContext) -> Result<Message, TriggerError> {
    match &raw.data {
        Value::Null => Ok(Message::default()),
        data => serde_json::from_value(data.clone()).map_err(|e| TriggerError::payload(context, e)),
    }
}

/// Builder for scheduled functions.
#[derive(Debug, Clone)]
pub struct ScheduleBuilder {
    schedule: Schedule,
    options: DeploymentOptions,
}

impl ScheduleBuilder {
    pub(crate) fn new(expression: &str, options: DeploymentOptions) -> Self {
        Self {
            schedule: Schedule {
                schedule: expression.to_string(),
                time_zone: None,
                retry_config: None,
            },
            options,
        }
    }

    /// IANA time zone the schedule is evaluated in.
    pub fn time_zone(mut self, time_zone: &str) -> Self {
        self.schedule.time_zone = Some(time_zone.to_string());
        self
    }

    pub fn retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.schedule.retry_config = Some(retry_config);
        self
    }

    /// Fires on every tick of the schedule.
    pub fn on_run<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        let trigger = EventTrigger {
            event_type: PUBLISH_EVENT.to_string(),
            // Replaced with the real topic once the export name is known.
            resource: topic_resource("firebase-schedule"),
            service: PUBSUB_SERVICE.to_string(),
        };
        let adapter = adapt(None, |_raw, _ctx| Ok(()), move |_: (), ctx| handler(ctx));
        CloudFunction::new(trigger, self.options.clone(), adapter).with_schedule(self.schedule.clone())
    }
}
