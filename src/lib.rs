//! Firebase Cloud Functions for Rust.
//!
//! Build typed triggers with the per-service builders, register them under their
//! export names in a [`Registry`](registry::Registry), and hand the registry to the
//! runtime [`server`]:
//!
//! ```rust,no_run
//! use firebase_functions::completion::Completion;
//! use firebase_functions::registry::Registry;
//! use firebase_functions::{database, https, server};
//!
//! # async fn run() -> anyhow::Result<()> {
//! server::init_logging();
//!
//! let mut registry = Registry::new();
//! registry.register(
//!     "onScoreWrite",
//!     database::reference("/scores/{uid}").on_write(|change, context| {
//!         tracing::info!(uid = %context.params["uid"], existed = change.before.exists(), "score written");
//!         Completion::Done
//!     }),
//! )?;
//! registry.register(
//!     "ping",
//!     https::on_request(|_req: https::Request<https::Bytes>| async { "pong" }),
//! )?;
//!
//! server::serve(registry, server::ServerConfig::from_env()?).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod change;
pub mod completion;
pub mod config;
pub mod context;
pub mod database;
pub mod firestore;
pub mod function;
pub mod https;
pub mod options;
pub mod path;
pub mod pubsub;
pub mod registry;
pub mod storage;

#[cfg(feature = "admin")]
pub mod admin;
#[cfg(feature = "admin")]
pub mod core;
#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "admin")]
pub use yup_oauth2;

pub use change::Change;
pub use completion::{Completion, HandlerError, Outcome};
pub use config::Config;
pub use context::{EventContext, RawEvent};
pub use function::{CloudFunction, Function};
pub use https::HttpsFunction;
pub use options::{region, run_with};
pub use registry::{Registry, RegistryError};
