//! Realtime Database REST client.

use crate::core::parse_error_response;
use crate::path::{join_path, normalize_path};
use reqwest::header;
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("invalid database URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// The database name of an instance URL, used as the emulator namespace.
pub(crate) fn namespace_of(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let host = url.host_str()?;
    host.split('.').next().map(str::to_string)
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

/// A Realtime Database instance.
#[derive(Clone)]
pub struct Database {
    client: ClientWithMiddleware,
    base_url: String,
    namespace: Option<String>,
}

impl Database {
    /// Builds a client for `base_url` using `client` as is.
    ///
    /// `namespace` is sent as the `ns` query parameter, which the emulator uses to
    /// pick the database.
    pub fn new_with_client(client: ClientWithMiddleware, base_url: &str, namespace: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A reference to `path`, relative to the root.
    pub fn reference(&self, path: &str) -> Reference {
        Reference {
            database: self.clone(),
            path: normalize_path(path),
        }
    }

    fn url_for(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, DatabaseError> {
        let mut url = Url::parse(&format!("{}/{}.json", self.base_url, path))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(namespace) = &self.namespace {
                pairs.append_pair("ns", namespace);
            }
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<reqwest::Response, DatabaseError> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let message = parse_error_response(response, &format!("Database {} failed", action)).await;
            return Err(DatabaseError::ApiError(message));
        }
        Ok(response)
    }
}

/// A location in the database.
#[derive(Clone)]
pub struct Reference {
    database: Database,
    path: String,
}

impl Reference {
    /// The path of this reference, without leading or trailing slashes.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The last path segment, or `None` at the root.
    pub fn key(&self) -> Option<&str> {
        if self.path.is_empty() {
            None
        } else {
            self.path.rsplit('/').next()
        }
    }

    pub fn child(&self, path: &str) -> Reference {
        Reference {
            database: self.database.clone(),
            path: join_path(&self.path, path),
        }
    }

    /// Reads the value at this location. `None` when nothing is stored there.
    pub async fn get<T: DeserializeOwned>(&self) -> Result<Option<T>, DatabaseError> {
        let url = self.database.url_for(&self.path, &[])?;
        debug!(path = %self.path, "database get");
        let response = self.database.send(self.database.client.get(url), "get").await?;
        let value: serde_json::Value = response.json().await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Replaces the value at this location.
    pub async fn set<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), DatabaseError> {
        let url = self.database.url_for(&self.path, &[("print", "silent")])?;
        debug!(path = %self.path, "database set");
        let request = self
            .database
            .client
            .put(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(value)?);
        self.database.send(request, "set").await?;
        Ok(())
    }

    /// Merges the given children into this location.
    pub async fn update<T: Serialize + ?Sized>(&self, values: &T) -> Result<(), DatabaseError> {
        let url = self.database.url_for(&self.path, &[("print", "silent")])?;
        debug!(path = %self.path, "database update");
        let request = self
            .database
            .client
            .patch(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(values)?);
        self.database.send(request, "update").await?;
        Ok(())
    }

    /// Appends a child with a generated key and returns a reference to it.
    pub async fn push<T: Serialize + ?Sized>(&self, value: &T) -> Result<Reference, DatabaseError> {
        let url = self.database.url_for(&self.path, &[])?;
        debug!(path = %self.path, "database push");
        let request = self
            .database
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(value)?);
        let response = self.database.send(request, "push").await?;
        let pushed: PushResponse = response.json().await?;
        Ok(self.child(&pushed.name))
    }

    /// Deletes the value at this location.
    pub async fn remove(&self) -> Result<(), DatabaseError> {
        let url = self.database.url_for(&self.path, &[("print", "silent")])?;
        debug!(path = %self.path, "database remove");
        self.database.send(self.database.client.delete(url), "remove").await?;
        Ok(())
    }
}
