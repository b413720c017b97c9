// ── Authenticated session ──
//
// One token exchange per run. The resulting `SdwanClient` is cloned into
// every worker; its connection pool is shared.

use std::time::Duration;

use serde_json::{Map, Value};
use sitepulse_api::{SdwanClient, TokenClient, TransportConfig};
use tracing::{debug, info};

use crate::config::{ApiConfig, Credentials};
use crate::error::CoreError;
use crate::model::Site;

/// An authenticated connection to the API.
#[derive(Debug, Clone)]
pub struct Session {
    client: SdwanClient,
    expires_in: Option<Duration>,
}

impl Session {
    /// Exchange `credentials` for a token and build the API client.
    pub async fn connect(api: &ApiConfig, credentials: &Credentials) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: api.tls.clone(),
            timeout: api.timeout,
        };
        let http = transport.build_client()?;

        debug!(auth_url = %api.auth_url, tsg_id = %credentials.tsg_id, "authenticating");
        let token = TokenClient::with_client(http.clone(), api.auth_url.clone())
            .request_token(&credentials.client_id, &credentials.secret, &credentials.tsg_id)
            .await?;
        info!(
            expires_in_secs = token.expires_in.map(|d| d.as_secs()),
            "authenticated"
        );

        let mut client = SdwanClient::with_client(http, api.base_url.clone(), token.access_token)
            .with_retry(api.retry.clone());
        if let Some(region) = &api.region {
            client = client.with_region(region.clone());
        }

        Ok(Self {
            client,
            expires_in: token.expires_in,
        })
    }

    pub fn client(&self) -> &SdwanClient {
        &self.client
    }

    /// Token lifetime reported by the identity service.
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }

    /// Every element in the tenant, as batch input.
    pub async fn sites(&self) -> Result<Vec<Site>, CoreError> {
        let elements = self.client.list_elements().await?;
        debug!(count = elements.len(), "elements listed");
        Ok(elements.into_iter().map(Site::from).collect())
    }

    /// Raw site records, for inventory export.
    pub async fn site_records(&self) -> Result<Vec<Map<String, Value>>, CoreError> {
        Ok(self.client.list_sites().await?)
    }
}
