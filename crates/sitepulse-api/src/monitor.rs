// Element interfaces and the `sys_metrics` time-series query.

use tracing::debug;

use crate::client::SdwanClient;
use crate::error::Error;
use crate::models::{InterfaceResponse, ItemsResponse, SysMetricsQuery, SysMetricsResponse};
use crate::retry::RetryOutcome;

impl SdwanClient {
    /// List the interfaces of one element.
    ///
    /// `GET /sdwan/v4.21/api/sites/{site_id}/elements/{element_id}/interfaces`
    pub async fn list_interfaces(
        &self,
        site_id: &str,
        element_id: &str,
    ) -> Result<Vec<InterfaceResponse>, Error> {
        let url = self.sdwan_url(&format!(
            "v4.21/api/sites/{site_id}/elements/{element_id}/interfaces"
        ))?;
        let resp: ItemsResponse<InterfaceResponse> = self
            .retry_policy()
            .run("list_interfaces", || self.get_json(url.clone()))
            .await?;
        Ok(resp.items)
    }

    /// Run a metrics query, retrying with the client's policy.
    ///
    /// `POST /sdwan/monitor/v2.3/api/monitor/sys_metrics`
    pub async fn sys_metrics(&self, query: &SysMetricsQuery) -> Result<SysMetricsResponse, Error> {
        self.sys_metrics_tagged(query).await.into_result()
    }

    /// Like [`sys_metrics`](Self::sys_metrics) but reports how many attempts were made.
    pub async fn sys_metrics_tagged(
        &self,
        query: &SysMetricsQuery,
    ) -> RetryOutcome<SysMetricsResponse> {
        let url = match self.sdwan_url("monitor/v2.3/api/monitor/sys_metrics") {
            Ok(url) => url,
            Err(error) => return RetryOutcome::Aborted { error, attempts: 0 },
        };
        debug!(
            metrics = query.metrics.len(),
            start = %query.start_time,
            end = %query.end_time,
            "querying sys_metrics"
        );
        self.retry_policy()
            .run_tagged("sys_metrics", || self.post_json(url.clone(), query, true))
            .await
    }
}
