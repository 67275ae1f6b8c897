//! Thin wrappers over the dashboard REST API.
//!
//! Every call carries the session's bearer token. A non-2xx answer becomes
//! an [`ApiError`] holding the most useful human message found in the
//! response; a 2xx body is parsed as JSON. There are no retries.

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::errors::ApiError;
use crate::session::Session;

pub mod chat;
pub mod notifications;
pub mod payment;
pub mod statistics;
pub mod users;

pub use statistics::StatsQuery;

/// REST client bound to one base URL and one session.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    http: Client,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(base: Url, session: Arc<Session>, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("tourdash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { base, http, session })
    }

    pub fn from_config(cfg: &Config, session: Arc<Session>) -> Result<Self, ApiError> {
        Self::new(cfg.api_base_url.clone(), session, cfg.timeout())
    }

    /// Resolve an absolute API path (`/api/...`) under the base URL,
    /// keeping any path prefix the base URL carries.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ApiError::Network(format!("invalid request url {}: {}", joined, e)))
    }

    /// Issue one request and parse the JSON answer as `T`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        tracing::debug!(method = %method, url = %url, "api request");

        let mut req = self
            .http
            .request(method.clone(), url)
            .header(reqwest::header::AUTHORIZATION, self.session.bearer())
            .header(reqwest::header::ACCEPT, "application/json");
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| {
            tracing::warn!(method = %method, path, error = %e, "api request failed");
            ApiError::from(e)
        })?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let err = ApiError::from_response_body(status, &text);
            tracing::warn!(
                method = %method,
                path,
                status = %status,
                message = %err,
                "api returned error status"
            );
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        self.request::<T, Value>(Method::GET, path, query, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, Value>(Method::PUT, path, &[], None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, Value>(Method::DELETE, path, &[], None).await
    }
}

/// Percent-encode one path segment.
pub(crate) fn segment(s: &str) -> Cow<'_, str> {
    urlencoding::encode(s)
}
