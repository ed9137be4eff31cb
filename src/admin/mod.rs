//! A small Admin client for use inside function handlers.
//!
//! [`FirebaseAdmin`] is an explicit handle: build one at startup and clone it into
//! the handlers that need it.
//!
//! ```rust,no_run
//! use firebase_functions::admin::FirebaseAdmin;
//! use firebase_functions::completion::Completion;
//! use firebase_functions::pubsub;
//!
//! # fn build(key: yup_oauth2::ServiceAccountKey) {
//! let admin = FirebaseAdmin::new(key);
//! let database = admin.database();
//! let _function = pubsub::topic("events").on_publish(move |message, _ctx| {
//!     let database = database.clone();
//!     Completion::pending(async move {
//!         let text = message.text()?;
//!         database.reference("messages/latest").set(&text).await?;
//!         Ok::<_, anyhow::Error>(())
//!     })
//! });
//! # }
//! ```

pub mod database;
pub mod pubsub;


pub use self::database::{Database, DatabaseError, Reference};
pub use self::pubsub::{PubSub, PubSubError, Topic};

use crate::config::FirebaseConfig;
use crate::core::middleware::AuthMiddleware;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use tracing::{debug, warn};
use yup_oauth2::ServiceAccountKey;

const DATABASE_EMULATOR_ENV: &str = "FIREBASE_DATABASE_EMULATOR_HOST";
const PUBSUB_EMULATOR_ENV: &str = "PUBSUB_EMULATOR_HOST";

pub(crate) fn retrying_client(middleware: Option<AuthMiddleware>) -> ClientWithMiddleware {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
    let builder = ClientBuilder::new(Client::new()).with(RetryTransientMiddleware::new_with_policy(retry_policy));
    match middleware {
        Some(middleware) => builder.with(middleware).build(),
        None => builder.build(),
    }
}

fn emulator_host(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|h| !h.is_empty())
}

/// Entry point to the Admin clients.
#[derive(Clone)]
pub struct FirebaseAdmin {
    middleware: AuthMiddleware,
    project_id: String,
}

impl FirebaseAdmin {
    pub fn new(key: ServiceAccountKey) -> Self {
        let project_id = key
            .project_id
            .clone()
            .or_else(crate::config::project_id)
            .unwrap_or_default();
        if project_id.is_empty() {
            warn!("service account key has no project id and GCLOUD_PROJECT is not set");
        }
        Self {
            middleware: AuthMiddleware::new(key),
            project_id,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn database_url(&self) -> String {
        let configured = match FirebaseConfig::from_env() {
            Ok(config) => config.and_then(|c| c.default_database_url()),
            Err(e) => {
                warn!(error = %e, "could not read FIREBASE_CONFIG");
                None
            }
        };
        configured.unwrap_or_else(|| format!("https://{}-default-rtdb.firebaseio.com", self.project_id))
    }

    /// The project's default Realtime Database.
    ///
    /// Honors `FIREBASE_DATABASE_EMULATOR_HOST`.
    pub fn database(&self) -> Database {
        self.database_at(&self.database_url())
    }

    /// A Realtime Database instance by URL, e.g. `https://my-db.firebaseio.com`.
    pub fn database_at(&self, url: &str) -> Database {
        match emulator_host(DATABASE_EMULATOR_ENV) {
            Some(host) => {
                let namespace = database::namespace_of(url);
                debug!(%host, ?namespace, "using the Realtime Database emulator");
                Database::new_with_client(retrying_client(None), &format!("http://{}", host), namespace)
            }
            None => Database::new_with_client(retrying_client(Some(self.middleware.clone())), url, None),
        }
    }

    /// Pub/Sub publisher. Honors `PUBSUB_EMULATOR_HOST`.
    pub fn pubsub(&self) -> PubSub {
        match emulator_host(PUBSUB_EMULATOR_ENV) {
            Some(host) => {
                debug!(%host, "using the Pub/Sub emulator");
                PubSub::new_with_client(retrying_client(None), &format!("http://{}/v1", host), &self.project_id)
            }
            None => PubSub::new(self.middleware.clone(), &self.project_id),
        }
    }
}
