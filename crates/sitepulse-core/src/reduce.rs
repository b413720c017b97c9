// ── Response reduction ──
//
// Turns one site's raw metrics response into a `ReportRow`: the arithmetic
// mean of each series plus the static IPv4 addresses of ports 1 and 2.
// Pure: the same input always yields the same row.

use indexmap::IndexMap;
use sitepulse_api::Datapoint;

use crate::error::ReduceError;
use crate::model::{Interface, RawSiteMetrics, ReportRow, Site};

/// Name of the per-element bandwidth metric.
pub const BANDWIDTH_METRIC: &str = "InterfaceBandwidthUsage";

/// Column holding the summary of the filtered-interface sub-query.
pub const FILTERED_BANDWIDTH_METRIC: &str = "filteredInterfaceBandwidthUsage";

/// Unweighted mean over every datapoint.
///
/// An empty series or a null value is an error, never a zero.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn mean(metric: &str, points: &[Datapoint]) -> Result<f64, ReduceError> {
    if points.is_empty() {
        return Err(ReduceError::EmptySeries {
            metric: metric.to_owned(),
        });
    }
    let mut sum = 0.0;
    for point in points {
        sum += point.value.ok_or_else(|| ReduceError::NullDatapoint {
            metric: metric.to_owned(),
        })?;
    }
    Ok(sum / points.len() as f64)
}

/// Reduce `raw` into the row for `site`.
///
/// `columns` fixes the metric column order and every one of them must come
/// back, except the filtered bandwidth column, which stays `None` when no
/// interface passed the filter. Extra series are appended after them.
pub fn reduce_site(
    index: usize,
    site: &Site,
    raw: &RawSiteMetrics,
    columns: &[String],
    resolve_addresses: bool,
) -> Result<ReportRow, ReduceError> {
    let mut metrics: IndexMap<String, Option<f64>> =
        columns.iter().map(|c| (c.clone(), None)).collect();

    for (position, group) in raw.metrics.iter().enumerate() {
        let series = group.series.first().ok_or_else(|| ReduceError::MissingSeries {
            metric: format!("#{position}"),
        })?;
        let data = series.data.first().ok_or_else(|| ReduceError::MissingData {
            metric: series.name.clone(),
        })?;
        let value = mean(&series.name, &data.datapoints)?;
        metrics.insert(series.name.clone(), Some(value));
    }

    if let Some(missing) = metrics
        .iter()
        .find(|(name, value)| value.is_none() && name.as_str() != FILTERED_BANDWIDTH_METRIC)
        .map(|(name, _)| name.clone())
    {
        return Err(ReduceError::MissingSeries { metric: missing });
    }

    let (ipv4_port1, ipv4_port2) = if resolve_addresses {
        let interfaces: Vec<Interface> = raw.interfaces.iter().map(Interface::from).collect();
        (
            static_address(&interfaces, "1"),
            static_address(&interfaces, "2"),
        )
    } else {
        (None, None)
    };

    Ok(ReportRow {
        index,
        site: site.clone(),
        metrics,
        ipv4_port1,
        ipv4_port2,
        error: None,
    })
}

/// Static address of the first interface named `port`.
fn static_address(interfaces: &[Interface], port: &str) -> Option<String> {
    interfaces
        .iter()
        .filter(|i| i.name == port)
        .find_map(Interface::static_address)
        .map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw() -> RawSiteMetrics {
        serde_json::from_value(json!({
            "metrics": [
                {"series": [{"name": "CPUUsage", "unit": "percentage", "data": [{"datapoints": [
                    {"time": "2024-01-01T00:00:00Z", "value": 10.0},
                    {"time": "2024-01-02T00:00:00Z", "value": 20.0},
                    {"time": "2024-01-03T00:00:00Z", "value": 33.0}
                ]}]}]},
                {"series": [{"name": "MemoryUsage", "unit": "percentage", "data": [{"datapoints": [
                    {"time": "2024-01-01T00:00:00Z", "value": 50.0}
                ]}]}]},
                {"series": [{"name": "DiskUsage", "unit": "percentage", "data": [{"datapoints": [
                    {"time": "2024-01-01T00:00:00Z", "value": 4.0},
                    {"time": "2024-01-02T00:00:00Z", "value": 6.0}
                ]}]}]}
            ],
            "interfaces": [
                {"id": "a", "name": "1", "ipv4_config": {"type": "static", "static_config": {"address": "10.0.0.1/30"}}},
                {"id": "b", "name": "2", "ipv4_config": {"type": "dhcp", "static_config": {"address": "10.9.9.9/24"}}},
                {"id": "c", "name": "3"}
            ]
        }))
        .unwrap()
    }

    fn columns() -> Vec<String> {
        vec!["CPUUsage".into(), "MemoryUsage".into(), "DiskUsage".into()]
    }

    fn with_filtered(mut columns: Vec<String>) -> Vec<String> {
        columns.push(FILTERED_BANDWIDTH_METRIC.into());
        columns
    }

    #[test]
    fn mean_is_arithmetic_mean() {
        let raw = raw();
        let points = &raw.metrics[0].series[0].data[0].datapoints;
        assert_eq!(mean("CPUUsage", points).unwrap(), 21.0);
    }

    #[test]
    fn empty_series_is_an_error() {
        assert_eq!(
            mean("CPUUsage", &[]),
            Err(ReduceError::EmptySeries {
                metric: "CPUUsage".into()
            })
        );
    }

    #[test]
    fn null_value_is_an_error() {
        let mut raw = raw();
        raw.metrics[1].series[0].data[0].datapoints[0].value = None;
        let err = reduce_site(0, &Site::new("s", "e", "x"), &raw, &columns(), true).unwrap_err();
        assert!(matches!(err, ReduceError::NullDatapoint { .. }));
    }

    #[test]
    fn row_keeps_column_order_and_resolves_static_ports() {
        let site = Site::new("s1", "e1", "Branch");
        let row = reduce_site(3, &site, &raw(), &columns(), true).unwrap();

        assert_eq!(row.index, 3);
        assert_eq!(
            row.metrics.keys().collect::<Vec<_>>(),
            vec!["CPUUsage", "MemoryUsage", "DiskUsage"]
        );
        assert_eq!(row.metric("CPUUsage"), Some(21.0));
        assert_eq!(row.metric("MemoryUsage"), Some(50.0));
        assert_eq!(row.metric("DiskUsage"), Some(5.0));
        assert_eq!(row.ipv4_port1.as_deref(), Some("10.0.0.1/30"));
        // Port 2 is DHCP: its stale static block is ignored.
        assert_eq!(row.ipv4_port2, None);
        assert!(!row.is_failure());
    }

    #[test]
    fn requested_metric_absent_from_response_fails_the_site() {
        let mut raw = raw();
        raw.metrics.truncate(1);
        let err = reduce_site(0, &Site::new("s", "e", "x"), &raw, &columns(), false).unwrap_err();
        assert_eq!(
            err,
            ReduceError::MissingSeries {
                metric: "MemoryUsage".into()
            }
        );
    }

    #[test]
    fn filtered_bandwidth_may_be_absent() {
        let site = Site::new("s1", "e1", "Branch");
        let row = reduce_site(0, &site, &raw(), &with_filtered(columns()), false).unwrap();
        assert_eq!(row.metric(FILTERED_BANDWIDTH_METRIC), None);
        assert_eq!(
            row.metrics.keys().last().map(String::as_str),
            Some(FILTERED_BANDWIDTH_METRIC)
        );
        assert!(!row.is_failure());
    }

    #[test]
    fn missing_data_block_propagates() {
        let mut raw = raw();
        raw.metrics[0].series[0].data.clear();
        let err = reduce_site(0, &Site::new("s", "e", "x"), &raw, &columns(), false).unwrap_err();
        assert_eq!(
            err,
            ReduceError::MissingData {
                metric: "CPUUsage".into()
            }
        );
    }

    #[test]
    fn reduction_is_idempotent() {
        let site = Site::new("s1", "e1", "Branch");
        let input = raw();
        let a = reduce_site(0, &site, &input, &columns(), true).unwrap();
        let b = reduce_site(0, &site, &input, &columns(), true).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.metric("CPUUsage").map(f64::to_bits),
            b.metric("CPUUsage").map(f64::to_bits)
        );
    }
}
