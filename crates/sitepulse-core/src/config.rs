// ── Runtime pipeline configuration ──
//
// These types describe how to reach the API and what to collect. They
// carry credential data and tuning but never touch disk; the CLI builds
// them from `sitepulse-config` and hands them in.

use std::time::Duration;

use secrecy::SecretString;
use sitepulse_api::{MetricSpec, RetryPolicy, TlsMode};
use url::Url;

use crate::filter::InterfaceFilter;

/// Service-account credentials for the token exchange.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub secret: SecretString,
    /// Tenant service group the token is scoped to.
    pub tsg_id: String,
}

/// Where and how to talk to the API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub auth_url: Url,
    /// Value of the `X-PANW-Region` header on monitoring calls.
    pub region: Option<String>,
    pub timeout: Duration,
    pub tls: TlsMode,
    pub retry: RetryPolicy,
}

impl ApiConfig {
    /// Config with the given endpoints and default tuning.
    pub fn new(base_url: Url, auth_url: Url) -> Self {
        Self {
            base_url,
            auth_url,
            region: Some("sg".into()),
            timeout: Duration::from_secs(30),
            tls: TlsMode::System,
            retry: RetryPolicy::default(),
        }
    }
}

/// What to collect for each site.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub metrics: Vec<MetricSpec>,
    /// Sampling interval passed to `sys_metrics`, e.g. `"1day"`.
    pub interval: String,
    pub filter: InterfaceFilter,
    /// Resolve static IPv4 addresses of ports 1 and 2 into the row.
    pub resolve_addresses: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            metrics: default_metrics(),
            interval: "1day".into(),
            filter: InterfaceFilter::default(),
            resolve_addresses: true,
        }
    }
}

/// CPU, memory and disk utilisation plus interface bandwidth.
pub fn default_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec::average("CPUUsage", "percentage"),
        MetricSpec::average("MemoryUsage", "percentage"),
        MetricSpec::average("DiskUsage", "percentage"),
        MetricSpec::average(crate::reduce::BANDWIDTH_METRIC, "Mbps"),
    ]
}

impl ReportConfig {
    /// Column names of a report row, in output order.
    ///
    /// The filtered bandwidth column follows the requested metrics when
    /// bandwidth is among them.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self.metrics.iter().map(|m| m.name.clone()).collect();
        if self.bandwidth_metric().is_some() {
            columns.push(crate::reduce::FILTERED_BANDWIDTH_METRIC.into());
        }
        columns
    }

    pub(crate) fn bandwidth_metric(&self) -> Option<&MetricSpec> {
        self.metrics
            .iter()
            .find(|m| m.name == crate::reduce::BANDWIDTH_METRIC)
    }
}
