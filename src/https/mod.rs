//! HTTPS triggers.
//!
//! Handlers work directly on [`http::Request`] and [`http::Response`] with a
//! [`Bytes`] body. The runtime server buffers the request body before calling the
//! handler.
//!
//! ```rust
//! use firebase_functions::https::{self, Bytes, Request, Response};
//!
//! let hello = https::on_request(|req: Request<Bytes>| async move {
//!     let name = req.uri().query().unwrap_or("world").to_string();
//!     Response::new(Bytes::from(format!("hello {}", name)))
//! });
//! # let _ = hello;
//! ```

#[cfg(test)]
mod tests;

pub use bytes::Bytes;
pub use http::{Request, Response, StatusCode};

use crate::options::DeploymentOptions;
use futures::future::BoxFuture;
use futures::FutureExt;
use http::header::{HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::error;

/// Converts a handler's return value into an HTTP response.
pub trait IntoResponse {
    fn into_response(self) -> Response<Bytes>;
}

impl IntoResponse for Response<Bytes> {
    fn into_response(self) -> Response<Bytes> {
        self
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response<Bytes> {
        text_response(self, Bytes::new())
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response<Bytes> {
        text_response(StatusCode::OK, Bytes::from(self))
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response<Bytes> {
        text_response(StatusCode::OK, Bytes::from_static(self.as_bytes()))
    }
}

/// Errors become a `500` carrying the error text.
impl<R, E> IntoResponse for Result<R, E>
where
    R: IntoResponse,
    E: Into<anyhow::Error>,
{
    fn into_response(self) -> Response<Bytes> {
        match self {
            Ok(response) => response.into_response(),
            Err(e) => {
                let e = e.into();
                error!(error = %e, "https handler failed");
                text_response(StatusCode::INTERNAL_SERVER_ERROR, Bytes::from(format!("{:#}", e)))
            }
        }
    }
}

pub(crate) fn text_response(status: StatusCode, body: Bytes) -> Response<Bytes> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

/// Serializes `body` as a JSON response. Serialization failures become a `500`.
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response<Bytes> {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = Response::new(Bytes::from(bytes));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => {
            error!(error = %e, "failed to serialize response body");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, Bytes::from(e.to_string()))
        }
    }
}

type RequestHandler = Arc<dyn Fn(Request<Bytes>) -> BoxFuture<'static, Response<Bytes>> + Send + Sync>;

/// Starts an HTTPS trigger with default options.
pub fn on_request<F, Fut, R>(handler: F) -> HttpsFunction
where
    F: Fn(Request<Bytes>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    HttpsFunction::new(handler, DeploymentOptions::default())
}

/// A function invoked directly by HTTP requests.
#[derive(Clone)]
pub struct HttpsFunction {
    handler: RequestHandler,
    options: DeploymentOptions,
}

impl HttpsFunction {
    pub(crate) fn new<F, Fut, R>(handler: F, options: DeploymentOptions) -> Self
    where
        F: Fn(Request<Bytes>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        let handler: RequestHandler = Arc::new(move |request| {
            let fut = handler(request);
            async move { fut.await.into_response() }.boxed()
        });
        Self { handler, options }
    }

    pub fn options(&self) -> &DeploymentOptions {
        &self.options
    }

    /// Calls the handler with one request.
    pub async fn call(&self, request: Request<Bytes>) -> Response<Bytes> {
        (self.handler)(request).await
    }
}

impl fmt::Debug for HttpsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpsFunction")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
