// OAuth2 client-credentials exchange against the SASE identity service.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, preview};
use crate::transport::TransportConfig;

/// Production identity endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://auth.apps.paloaltonetworks.com";

/// A bearer token returned by the token endpoint.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub access_token: SecretString,
    pub token_type: String,
    pub expires_in: Option<Duration>,
    pub scope: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".into()
}

/// Requests access tokens for a service account scoped to one tenant.
pub struct TokenClient {
    http: reqwest::Client,
    auth_url: Url,
}

impl TokenClient {
    pub fn new(auth_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            auth_url,
        })
    }

    pub fn with_client(http: reqwest::Client, auth_url: Url) -> Self {
        Self { http, auth_url }
    }

    /// Exchange client credentials for a token scoped to `tsg_id`.
    ///
    /// `POST {auth_url}/oauth2/access_token` with HTTP basic auth and a
    /// `client_credentials` grant. Any non-success status is reported as
    /// [`Error::Authentication`].
    pub async fn request_token(
        &self,
        client_id: &str,
        secret: &SecretString,
        tsg_id: &str,
    ) -> Result<AccessToken, Error> {
        let base = self.auth_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{base}/oauth2/access_token"))?;
        let scope = format!("tsg_id:{tsg_id}");
        debug!(%url, client_id, "requesting access token");

        let resp = self
            .http
            .post(url)
            .basic_auth(client_id, Some(secret.expose_secret()))
            .form(&[("grant_type", "client_credentials"), ("scope", scope.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("token request rejected (HTTP {status}): {}", preview(&body)),
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            })?;

        debug!(expires_in = ?token.expires_in, "access token issued");
        Ok(AccessToken {
            access_token: SecretString::from(token.access_token),
            token_type: token.token_type,
            expires_in: token.expires_in.map(Duration::from_secs),
            scope: token.scope,
        })
    }
}
