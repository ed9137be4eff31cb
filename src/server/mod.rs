//! HTTP runtime server.
//!
//! Serves a [`Registry`] over HTTP/1 the way the Cloud Functions runtime calls it:
//! HTTPS functions receive the request, event functions receive a POSTed event
//! envelope.
//!
//! ```rust,no_run
//! use firebase_functions::completion::Completion;
//! use firebase_functions::registry::Registry;
//! use firebase_functions::server::{self, ServerConfig};
//! use firebase_functions::pubsub;
//!
//! # async fn run() -> anyhow::Result<()> {
//! server::init_logging();
//! let mut registry = Registry::new();
//! registry.register("onEvent", pubsub::topic("events").on_publish(|_m, _c| Completion::Done))?;
//! server::serve(registry, ServerConfig::from_env()?).await?;
//! # Ok(())
//! # }
//! ```


use crate::context::RawEvent;
use crate::function::Function;
use crate::https::{json_response, text_response};
use crate::registry::Registry;
use bytes::Bytes;
use http::{Method, Request, Response, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

pub const DEFAULT_PORT: u16 = 8080;
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);
const HEALTH_PATH: &str = "/healthz";
const MANIFEST_PATH: &str = "/__/functions.json";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid PORT value '{0}'")]
    InvalidPort(String),
    #[error("unknown FUNCTION_TARGET '{0}'")]
    UnknownTarget(String),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Calling it more than once is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Where to listen and which function `/` dispatches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub target: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            target: None,
        }
    }
}

impl ServerConfig {
    /// Reads `PORT` and `FUNCTION_TARGET`.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(port) = lookup("PORT").filter(|p| !p.is_empty()) {
            let port = port.parse().map_err(|_| ServerError::InvalidPort(port.clone()))?;
            config.addr.set_port(port);
        }
        config.target = lookup("FUNCTION_TARGET").filter(|t| !t.is_empty());
        Ok(config)
    }
}

/// Binds `config.addr` and serves until Ctrl-C.
pub async fn serve(registry: Registry, config: ServerConfig) -> Result<(), ServerError> {
    if let Some(target) = &config.target {
        if !registry.contains(target) {
            return Err(ServerError::UnknownTarget(target.clone()));
        }
    }
    let listener = TcpListener::bind(config.addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.addr,
            source,
        })?;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };
    run(listener, Arc::new(registry), config.target, shutdown).await;
    Ok(())
}

/// Waits for the next connection. Failed accepts are logged and retried.
async fn accept_next<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(connection) => return connection,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

/// Serves connections from `listener` until `shutdown` resolves.
pub async fn run<S>(listener: TcpListener, registry: Arc<Registry>, target: Option<String>, shutdown: S)
where
    S: Future<Output = ()>,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, functions = registry.len(), target = ?target, "functions server listening");
    }
    let target: Option<Arc<str>> = target.map(Arc::from);
    tokio::pin!(shutdown);

    loop {
        let (stream, remote) = tokio::select! {
            accepted = accept_next(|| listener.accept()) => accepted,
            _ = &mut shutdown => {
                info!("functions server shutting down");
                return;
            }
        };

        let registry = registry.clone();
        let target = target.clone();
        tokio::spawn(async move {
            let service = service_fn(move |request: Request<Incoming>| {
                let registry = registry.clone();
                let target = target.clone();
                async move {
                    let (parts, body) = request.into_parts();
                    let response = match body.collect().await {
                        Ok(collected) => {
                            let request = Request::from_parts(parts, collected.to_bytes());
                            handle(&registry, target.as_deref(), request).await
                        }
                        Err(e) => text_response(StatusCode::BAD_REQUEST, Bytes::from(e.to_string())),
                    };
                    Ok::<_, Infallible>(response.map(Full::new))
                }
            });
            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!(%remote, error = %e, "connection closed with error");
            }
        });
    }
}

/// Routes one buffered request against the registry.
pub async fn handle(registry: &Registry, target: Option<&str>, request: Request<Bytes>) -> Response<Bytes> {
    let path = request.uri().path();
    if path == HEALTH_PATH {
        return health(request.method());
    }
    if path == MANIFEST_PATH {
        if request.method() != Method::GET {
            return status(StatusCode::METHOD_NOT_ALLOWED);
        }
        return json_response(StatusCode::OK, &registry.manifest());
    }

    let (name, rest) = match target {
        Some(target) => (target.to_string(), path.to_string()),
        None => {
            let trimmed = path.trim_start_matches('/');
            let (name, rest) = trimmed.split_once('/').unwrap_or((trimmed, ""));
            (name.to_string(), format!("/{}", rest))
        }
    };

    match registry.get(&name) {
        Some(Function::Https(function)) => match strip_function_name(request, &rest) {
            Ok(request) => {
                debug!(function = %name, "invoking https function");
                function.call(request).await
            }
            Err(response) => response,
        },
        Some(Function::Event(_)) => handle_event(registry, &name, request).await,
        None => {
            warn!(function = %name, "no such function");
            text_response(
                StatusCode::NOT_FOUND,
                Bytes::from(format!("function '{}' not found", name)),
            )
        }
    }
}

fn health(method: &Method) -> Response<Bytes> {
    match *method {
        Method::GET | Method::HEAD => text_response(StatusCode::OK, Bytes::from_static(b"OK")),
        _ => text_response(StatusCode::BAD_REQUEST, Bytes::from_static(b"Bad Request")),
    }
}

fn status(code: StatusCode) -> Response<Bytes> {
    text_response(code, Bytes::new())
}

fn strip_function_name(request: Request<Bytes>, path: &str) -> Result<Request<Bytes>, Response<Bytes>> {
    let (mut parts, body) = request.into_parts();
    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };
    parts.uri = Uri::builder()
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| text_response(StatusCode::BAD_REQUEST, Bytes::from(e.to_string())))?;
    Ok(Request::from_parts(parts, body))
}

async fn handle_event(registry: &Registry, name: &str, request: Request<Bytes>) -> Response<Bytes> {
    if request.method() != Method::POST {
        return status(StatusCode::METHOD_NOT_ALLOWED);
    }

    let raw = match RawEvent::from_slice(request.body()) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(function = name, error = %e, "rejected event envelope");
            return text_response(StatusCode::BAD_REQUEST, Bytes::from(e.to_string()));
        }
    };
    let event_id = raw.context.event_id.clone();

    let outcome = match registry.dispatch_event(name, raw) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(function = name, %event_id, error = %e, "rejected event");
            return text_response(StatusCode::BAD_REQUEST, Bytes::from(e.to_string()));
        }
    };

    match outcome.settle().await {
        Ok(None) | Ok(Some(serde_json::Value::Null)) => status(StatusCode::OK),
        Ok(Some(value)) => json_response(StatusCode::OK, &value),
        Err(e) => {
            error!(function = name, %event_id, error = %e, "function failed");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, Bytes::from(e.to_string()))
        }
    }
}
