// SD-WAN API HTTP client
//
// Wraps `reqwest::Client` with URL construction, bearer auth, status
// validation and JSON decoding. Endpoint groups (inventory, monitor) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, preview};
use crate::retry::RetryPolicy;
use crate::transport::TransportConfig;

/// Production API gateway.
pub const DEFAULT_BASE_URL: &str = "https://api.sase.paloaltonetworks.com";

/// Region header required by the monitoring endpoints.
pub(crate) const REGION_HEADER: &str = "X-PANW-Region";

/// Authenticated client for the SD-WAN REST API.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted, so one
/// instance can be handed to every batch worker.
#[derive(Clone)]
pub struct SdwanClient {
    http: reqwest::Client,
    base_url: Url,
    token: SecretString,
    region: Option<String>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for SdwanClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdwanClient")
            .field("base_url", &self.base_url.as_str())
            .field("region", &self.region)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl SdwanClient {
    /// Create a client from a `TransportConfig` and an issued bearer token.
    pub fn new(
        base_url: Url,
        token: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, token))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, token: SecretString) -> Self {
        Self {
            http,
            base_url,
            token,
            region: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Send `X-PANW-Region: <region>` on monitoring requests.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Replace the retry schedule used by every endpoint call.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/sdwan/{path}`.
    pub(crate) fn sdwan_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/sdwan/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Single GET attempt, decoded as `T`.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;
        Self::parse_response(&url, resp).await
    }

    /// Single POST attempt with a JSON body, decoded as `T`.
    ///
    /// Adds the region header when `regional` is set and a region is configured.
    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
        regional: bool,
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let mut builder = self
            .http
            .post(url.clone())
            .bearer_auth(self.token.expose_secret())
            .json(body);
        if regional {
            if let Some(region) = &self.region {
                builder = builder.header(REGION_HEADER, region);
            }
        }
        let resp = builder.send().await?;
        Self::parse_response(&url, resp).await
    }

    /// Validate the HTTP status, then decode the body.
    async fn parse_response<T: DeserializeOwned>(
        url: &Url,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await?;
        trace!(status = status.as_u16(), bytes = body.len(), "response received");

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                endpoint: url.path().to_owned(),
                preview: preview(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}
