//! Firebase Auth user lifecycle triggers.

pub mod models;


pub use self::models::{UserInfo, UserMetadata, UserRecord};

use crate::completion::Completion;
use crate::context::{EventContext, RawEvent};
use crate::function::{adapt, CloudFunction, EventTrigger, TriggerError};
use crate::options::DeploymentOptions;

const AUTH_SERVICE: &str = "firebaseauth.googleapis.com";
const EVENT_PREFIX: &str = "providers/firebase.auth/eventTypes/user.";

/// Starts a trigger on user accounts of the current project.
pub fn user() -> UserBuilder {
    UserBuilder::new(DeploymentOptions::default())
}

#[derive(Debug, Clone)]
pub struct UserBuilder {
    options: DeploymentOptions,
}

impl UserBuilder {
    pub(crate) fn new(options: DeploymentOptions) -> Self {
        Self { options }
    }

    fn build<H, C>(&self, action: &str, handler: H) -> CloudFunction
    where
        H: Fn(UserRecord, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        let project = crate::config::project_id().unwrap_or_else(|| "_".to_string());
        let trigger = EventTrigger {
            event_type: format!("{}{}", EVENT_PREFIX, action),
            resource: format!("projects/{}", project),
            service: AUTH_SERVICE.to_string(),
        };
        CloudFunction::new(trigger, self.options.clone(), adapt(None, decode_user, handler))
    }

    /// Fires when a user account is created.
    pub fn on_create<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(UserRecord, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("create", handler)
    }

    /// Fires when a user account is deleted.
    pub fn on_delete<H, C>(&self, handler: H) -> CloudFunction
    where
        H: Fn(UserRecord, EventContext) -> C + Send + Sync + 'static,
        C: Into<Completion>,
    {
        self.build("delete", handler)
    }
}

fn decode_user(raw: &RawEvent, context: &EventContext) -> Result<UserRecord, TriggerError> {
    let user: UserRecord =
        serde_json::from_value(raw.data.clone()).map_err(|e| TriggerError::payload(context, e))?;
    if user.uid.is_empty() {
        return Err(TriggerError::invalid(context, "user record has no uid"));
    }
    Ok(user)
}
