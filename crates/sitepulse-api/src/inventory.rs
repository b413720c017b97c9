// Inventory endpoints: elements and sites.

use serde_json::{Map, Value};

use crate::client::SdwanClient;
use crate::error::Error;
use crate::models::{ElementResponse, ItemsResponse};

impl SdwanClient {
    /// List every element in the tenant.
    ///
    /// `GET /sdwan/v3.1/api/elements`
    pub async fn list_elements(&self) -> Result<Vec<ElementResponse>, Error> {
        let url = self.sdwan_url("v3.1/api/elements")?;
        let resp: ItemsResponse<ElementResponse> = self
            .retry_policy()
            .run("list_elements", || self.get_json(url.clone()))
            .await?;
        Ok(resp.items)
    }

    /// List every site in the tenant as loosely-typed records.
    ///
    /// `GET /sdwan/v4.8/api/sites`
    pub async fn list_sites(&self) -> Result<Vec<Map<String, Value>>, Error> {
        let url = self.sdwan_url("v4.8/api/sites")?;
        let resp: ItemsResponse<Map<String, Value>> = self
            .retry_policy()
            .run("list_sites", || self.get_json(url.clone()))
            .await?;
        Ok(resp.items)
    }
}
