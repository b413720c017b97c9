// Request and response schemas for the SD-WAN REST endpoints.
//
// Field names follow the upstream JSON exactly; optional descriptive
// fields are `Option` so inventory rows from older firmware still decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paged collection wrapper: `{ "items": [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

// ── Inventory ────────────────────────────────────────────────────────

/// An element (managed device) from `GET /sdwan/v3.1/api/elements`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementResponse {
    pub id: String,
    pub site_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub hw_id: Option<String>,
    #[serde(default)]
    pub software_version: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
}

// ── Interfaces ───────────────────────────────────────────────────────

/// An element interface.
///
/// Only the fields the pipeline reads are typed; the rest of the record
/// is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceResponse {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ipv4_config: Option<Ipv4Config>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ipv4Config {
    /// `"static"`, `"dhcp"`, `"pppoe"`, ...
    #[serde(rename = "type", default)]
    pub config_type: Option<String>,
    #[serde(default)]
    pub static_config: Option<StaticIpv4Config>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticIpv4Config {
    #[serde(default)]
    pub address: Option<String>,
}

// ── Metrics query ────────────────────────────────────────────────────

/// One metric requested from `sys_metrics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    #[serde(default = "default_statistics")]
    pub statistics: Vec<String>,
    pub unit: String,
}

fn default_statistics() -> Vec<String> {
    vec!["average".into()]
}

impl MetricSpec {
    pub fn average(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            statistics: default_statistics(),
            unit: unit.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFilter {
    pub site: Vec<String>,
    pub element: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricView {
    pub individual: String,
    pub summary: bool,
}

impl MetricView {
    /// Per-interface series plus one aggregated summary series.
    pub fn interface_summary() -> Self {
        Self {
            individual: "interface".into(),
            summary: true,
        }
    }
}

/// Body of `POST /sdwan/monitor/v2.3/api/monitor/sys_metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SysMetricsQuery {
    /// RFC 3339 with milliseconds, e.g. `2024-01-01T00:00:00.000Z`.
    pub start_time: String,
    pub end_time: String,
    pub interval: String,
    pub metrics: Vec<MetricSpec>,
    pub filter: MetricFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<MetricView>,
}

// ── Metrics response ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SysMetricsResponse {
    #[serde(default)]
    pub metrics: Vec<MetricGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricGroup {
    #[serde(default)]
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    /// `"summary"` on the aggregated series of a view query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(default)]
    pub data: Vec<SeriesData>,
}

impl Series {
    pub fn is_summary(&self) -> bool {
        self.view.as_deref() == Some("summary")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesData {
    #[serde(default)]
    pub datapoints: Vec<Datapoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    pub time: DateTime<Utc>,
    pub value: Option<f64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn query_omits_absent_interface_and_view() {
        let query = SysMetricsQuery {
            start_time: "2024-01-01T00:00:00.000Z".into(),
            end_time: "2024-01-02T00:00:00.000Z".into(),
            interval: "1day".into(),
            metrics: vec![MetricSpec::average("CPUUsage", "percentage")],
            filter: MetricFilter {
                site: vec!["s1".into()],
                element: vec!["e1".into()],
                interface: None,
            },
            view: None,
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            json!({
                "start_time": "2024-01-01T00:00:00.000Z",
                "end_time": "2024-01-02T00:00:00.000Z",
                "interval": "1day",
                "metrics": [{"name": "CPUUsage", "statistics": ["average"], "unit": "percentage"}],
                "filter": {"site": ["s1"], "element": ["e1"]}
            })
        );
    }

    #[test]
    fn interface_keeps_unknown_fields() {
        let iface: InterfaceResponse = serde_json::from_value(json!({
            "id": "i1",
            "name": "1",
            "admin_up": true,
            "ipv4_config": {"type": "static", "static_config": {"address": "10.0.0.1/24"}}
        }))
        .unwrap();
        assert_eq!(iface.name.as_deref(), Some("1"));
        assert_eq!(iface.extra["admin_up"], json!(true));
        let cfg = iface.ipv4_config.unwrap();
        assert_eq!(cfg.config_type.as_deref(), Some("static"));
        assert_eq!(
            cfg.static_config.unwrap().address.as_deref(),
            Some("10.0.0.1/24")
        );
    }

    #[test]
    fn series_accepts_null_values() {
        let series: Series = serde_json::from_value(json!({
            "name": "CPUUsage",
            "unit": "percentage",
            "data": [{"datapoints": [
                {"time": "2024-01-01T00:00:00Z", "value": 12.5},
                {"time": "2024-01-02T00:00:00Z", "value": null}
            ]}]
        }))
        .unwrap();
        assert!(!series.is_summary());
        assert_eq!(series.data[0].datapoints[1].value, None);
    }
}
