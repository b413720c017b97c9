// ── Metric client ──
//
// Per site: list the element's interfaces, query system metrics, and when
// bandwidth is requested and some interfaces pass the filter, run the
// per-interface summary sub-query and append its summary series.

use std::future::Future;

use sitepulse_api::{
    MetricFilter, MetricGroup, MetricSpec, MetricView, SdwanClient, Series, SysMetricsQuery,
};
use tracing::debug;

use crate::config::ReportConfig;
use crate::error::{CoreError, ReduceError};
use crate::model::{Interface, MetricWindow, RawSiteMetrics, ReportRow, Site};
use crate::reduce::{FILTERED_BANDWIDTH_METRIC, reduce_site};

/// Where the scheduler gets raw metrics from.
pub trait MetricSource: Send + Sync + 'static {
    fn fetch(
        &self,
        site: &Site,
        window: &MetricWindow,
        report: &ReportConfig,
    ) -> impl Future<Output = Result<RawSiteMetrics, CoreError>> + Send;
}

/// `MetricSource` backed by the SD-WAN API.
#[derive(Debug, Clone)]
pub struct ApiMetricSource {
    client: SdwanClient,
}

impl ApiMetricSource {
    pub fn new(client: SdwanClient) -> Self {
        Self { client }
    }
}

impl MetricSource for ApiMetricSource {
    async fn fetch(
        &self,
        site: &Site,
        window: &MetricWindow,
        report: &ReportConfig,
    ) -> Result<RawSiteMetrics, CoreError> {
        let interfaces = self
            .client
            .list_interfaces(&site.site_id, &site.element_id)
            .await?;
        let parsed: Vec<Interface> = interfaces.iter().map(Interface::from).collect();
        let selected = report.filter.select(&site.name, &parsed);
        debug!(
            site = %site.name,
            interfaces = parsed.len(),
            selected = selected.len(),
            "interfaces filtered"
        );

        let query = site_query(site, window, report.metrics.clone());
        let mut response = self.client.sys_metrics(&query).await?;

        if let Some(bandwidth) = report.bandwidth_metric() {
            if !selected.is_empty() {
                let sub = interface_summary_query(site, window, bandwidth.clone(), selected);
                let sub_response = self.client.sys_metrics(&sub).await?;
                let summary = summary_series(sub_response.metrics)?;
                response.metrics.push(MetricGroup {
                    series: vec![summary],
                });
            }
        }

        Ok(RawSiteMetrics {
            metrics: response.metrics,
            interfaces,
        })
    }
}

/// Element-wide query for every requested metric.
pub fn site_query(site: &Site, window: &MetricWindow, metrics: Vec<MetricSpec>) -> SysMetricsQuery {
    SysMetricsQuery {
        start_time: window.start_time(),
        end_time: window.end_time(),
        interval: window.interval.clone(),
        metrics,
        filter: MetricFilter {
            site: vec![site.site_id.clone()],
            element: vec![site.element_id.clone()],
            interface: None,
        },
        view: None,
    }
}

/// Bandwidth across `interfaces`, with a summary series.
pub fn interface_summary_query(
    site: &Site,
    window: &MetricWindow,
    bandwidth: MetricSpec,
    interfaces: Vec<String>,
) -> SysMetricsQuery {
    let mut query = site_query(site, window, vec![bandwidth]);
    query.filter.interface = Some(interfaces);
    query.view = Some(MetricView::interface_summary());
    query
}

/// The summary series of a view response, renamed to the filtered column.
fn summary_series(groups: Vec<MetricGroup>) -> Result<Series, ReduceError> {
    let mut summary = groups
        .into_iter()
        .flat_map(|g| g.series)
        .find(Series::is_summary)
        .ok_or_else(|| ReduceError::MissingSeries {
            metric: FILTERED_BANDWIDTH_METRIC.into(),
        })?;
    summary.name = FILTERED_BANDWIDTH_METRIC.into();
    Ok(summary)
}

/// Fetch and reduce one site.
pub async fn collect_site<S: MetricSource>(
    source: &S,
    index: usize,
    site: &Site,
    window: &MetricWindow,
    report: &ReportConfig,
) -> Result<(ReportRow, RawSiteMetrics), CoreError> {
    let raw = source.fetch(site, window, report).await?;
    let row = reduce_site(
        index,
        site,
        &raw,
        &report.columns(),
        report.resolve_addresses,
    )?;
    Ok((row, raw))
}
