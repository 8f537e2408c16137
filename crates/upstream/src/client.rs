//! Upstream client interface and its HTTP implementation.
//!
//! The rest of the system only sees the [`UpstreamClient`] trait: a
//! reachability probe and a lightweight "is this session still valid"
//! check. [`HttpUpstreamClient`] implements it over the real service with
//! bounded connect and request timeouts; tests substitute their own stubs.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::{config::MonitorConfig, error::UpstreamError};

/// A session secret pair, held zeroizing in memory.
pub struct SessionPair {
    /// The `sessionid` cookie value.
    pub id: Zeroizing<String>,
    /// The `csrftoken` cookie value.
    pub token: Zeroizing<String>,
}

/// Client-side view of the upstream service.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Probes the upstream for availability.
    ///
    /// `true` only for a clean HTTP 200 within the configured timeouts;
    /// any timeout, transport failure or other status is `false`.
    async fn probe(&self) -> bool;

    /// Checks whether a stored session is still valid upstream.
    ///
    /// - `Ok(true)` — the session is definitively valid
    /// - `Ok(false)` — the session is definitively invalid
    /// - `Err(_)` — indeterminate; the caller must not treat this as invalid
    async fn check_credentials(&self, pair: &SessionPair) -> Result<bool, UpstreamError>;
}

/// [`UpstreamClient`] over HTTP.
pub struct HttpUpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpUpstreamClient {
    /// Builds an HTTP client from the monitor configuration.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Connection`] if the underlying client
    /// cannot be constructed (TLS backend initialization).
    pub fn new(config: &MonitorConfig) -> Result<Self, UpstreamError> {
        // Redirects are significant: the upstream answers a dead session
        // with a redirect to its login page, which must not be followed
        // into a misleading 200.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_owned() })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn probe(&self) -> bool {
        match self.http.get(&self.base_url).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(err) => {
                tracing::debug!(error = %err, "availability probe failed");
                false
            },
        }
    }

    async fn check_credentials(&self, pair: &SessionPair) -> Result<bool, UpstreamError> {
        let url = format!("{}/user/current", self.base_url);
        let response = self
            .http
            .get(&url)
            .header(
                reqwest::header::COOKIE,
                format!("sessionid={}; csrftoken={}", pair.id.as_str(), pair.token.as_str()),
            )
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(true),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => Ok(false),
            // A redirect to the login page also means the session is dead.
            reqwest::StatusCode::FOUND | reqwest::StatusCode::SEE_OTHER => Ok(false),
            other => Err(UpstreamError::Status(other.as_u16())),
        }
    }
}
