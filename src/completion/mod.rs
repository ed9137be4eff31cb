//! Handler completion and the signal handed back to the runtime.
//!
//! A handler returns a [`Completion`]: either [`Completion::Done`] when it did no
//! asynchronous work, or [`Completion::Pending`] wrapping the future that finishes it.
//! Adapters turn that into an [`Outcome`]. A finished handler always becomes
//! [`Outcome::Placeholder`], never its raw return value; the Cloud Functions runtime
//! expects a settled non-empty value from handlers that return no promise.

#[cfg(test)]
mod tests;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// An error produced by a user handler.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct HandlerError(#[from] anyhow::Error);

impl HandlerError {
    pub fn msg<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self(anyhow::Error::msg(message))
    }

    pub fn into_inner(self) -> anyhow::Error {
        self.0
    }
}

/// What a handler hands back to its adapter.
pub enum Completion {
    /// The handler finished synchronously.
    Done,
    /// The handler has asynchronous work still running.
    Pending(BoxFuture<'static, Result<Value, HandlerError>>),
}

impl Completion {
    /// Wraps an asynchronous handler body.
    ///
    /// The resolved value is serialized to JSON; `()` resolves to `null`.
    pub fn pending<F, T, E>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Serialize,
        E: Into<anyhow::Error>,
    {
        Completion::Pending(
            async move {
                let value = future.await.map_err(|e| HandlerError(e.into()))?;
                serde_json::to_value(value).map_err(|e| HandlerError(e.into()))
            }
            .boxed(),
        )
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Completion::Pending(_))
    }

    /// Converts the completion into the runtime's completion signal.
    pub fn into_outcome(self) -> Outcome {
        match self {
            Completion::Done => Outcome::Placeholder,
            Completion::Pending(future) => Outcome::Pending(future),
        }
    }
}

impl From<()> for Completion {
    fn from(_: ()) -> Self {
        Completion::Done
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Done => f.write_str("Completion::Done"),
            Completion::Pending(_) => f.write_str("Completion::Pending(..)"),
        }
    }
}

/// The completion signal returned by an adapted trigger.
pub enum Outcome {
    /// Returned synchronously when the handler produced no asynchronous result.
    Placeholder,
    /// Settles in lockstep with the handler's pending future.
    Pending(BoxFuture<'static, Result<Value, HandlerError>>),
}

impl Outcome {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Outcome::Placeholder)
    }

    /// Waits for the outcome. The placeholder settles immediately with `None`.
    pub async fn settle(self) -> Result<Option<Value>, HandlerError> {
        match self {
            Outcome::Placeholder => Ok(None),
            Outcome::Pending(future) => future.await.map(Some),
        }
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Placeholder => f.write_str("Outcome::Placeholder"),
            Outcome::Pending(_) => f.write_str("Outcome::Pending(..)"),
        }
    }
}
