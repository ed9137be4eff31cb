use http::Extensions;
use reqwest::{header, Request, Response};
use reqwest_middleware::{Middleware, Next};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

/// OAuth2 scopes requested for Admin calls.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/firebase.database",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/pubsub",
];

/// Adds a service account bearer token to every request.
///
/// The authenticator is built on first use and shared between clones.
#[derive(Clone)]
pub struct AuthMiddleware {
    pub key: ServiceAccountKey,
    authenticator: Arc<OnceCell<DefaultAuthenticator>>,
}

impl AuthMiddleware {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            authenticator: Arc::new(OnceCell::new()),
        }
    }

    async fn get_token(&self) -> Result<String, anyhow::Error> {
        let auth = self
            .authenticator
            .get_or_try_init(|| async {
                debug!(client_email = %self.key.client_email, "building service account authenticator");
                ServiceAccountAuthenticator::builder(self.key.clone()).build().await
            })
            .await?;

        let token = auth.token(SCOPES).await?;
        Ok(token
            .token()
            .ok_or_else(|| anyhow::anyhow!("no access token returned"))?
            .to_string())
    }
}

#[async_trait::async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let token = self.get_token().await.map_err(|e| {
            reqwest_middleware::Error::Middleware(anyhow::anyhow!("failed to get auth token: {}", e))
        })?;

        let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| reqwest_middleware::Error::Middleware(e.into()))?;
        req.headers_mut().insert(header::AUTHORIZATION, value);

        next.run(req, extensions).await
    }
}
