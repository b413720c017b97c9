//! Report writer: tabular exports and per-site charts.

pub mod chart;
pub mod spreadsheet;

use chrono::{DateTime, Local};
use serde_json::{Map, Value};

use sitepulse_core::ReportRow;

pub use spreadsheet::{CsvWriter, SpreadsheetWriter};

/// File name of the bulk report export.
pub const REPORT_FILE: &str = "site_list_with_resource_metric.csv";

const SITE_HEADERS: [&str; 8] = [
    "index",
    "site_id",
    "element_id",
    "name",
    "model_name",
    "serial_number",
    "software_version",
    "hw_id",
];

/// A rectangular dataset. `None` cells are written empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// One row per report row: site identity, metric columns in `columns`
    /// order, port addresses, error.
    pub fn from_report(columns: &[String], rows: &[ReportRow]) -> Self {
        let headers = SITE_HEADERS
            .iter()
            .map(|h| (*h).to_owned())
            .chain(columns.iter().cloned())
            .chain(["ipv4_port1", "ipv4_port2", "error"].map(String::from))
            .collect();

        let rows = rows
            .iter()
            .map(|row| {
                let s = &row.site;
                let mut cells = vec![
                    Some(row.index.to_string()),
                    Some(s.site_id.clone()),
                    Some(s.element_id.clone()),
                    Some(s.name.clone()),
                    s.model_name.clone(),
                    s.serial_number.clone(),
                    s.software_version.clone(),
                    s.hw_id.clone(),
                ];
                cells.extend(columns.iter().map(|c| row.metric(c).map(|v| v.to_string())));
                cells.push(row.ipv4_port1.clone());
                cells.push(row.ipv4_port2.clone());
                cells.push(row.error.clone());
                cells
            })
            .collect();

        Self { headers, rows }
    }

    /// Loosely-typed records. Headers are the union of keys in first-seen order.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|h| record.get(h).and_then(cell_text))
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub(crate) fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Flatten one level of nesting: `{"a": {"b": 1}}` becomes `{"a_b": 1}`.
pub fn flatten_record(record: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in record {
        match value {
            Value::Object(inner) => {
                for (child, v) in inner {
                    out.insert(format!("{key}_{child}"), v.clone());
                }
            }
            other => {
                out.insert(key.clone(), other.clone());
            }
        }
    }
    out
}

/// `name` with a `%Y%m%d_%H%M%S-` prefix.
pub fn timestamped(name: &str, now: DateTime<Local>) -> String {
    format!("{}-{name}", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sitepulse_core::Site;

    #[test]
    fn report_rows_keep_column_order_and_blank_nulls() {
        let columns = vec!["CPUUsage".to_owned(), "DiskUsage".to_owned()];
        let mut metrics = IndexMap::new();
        metrics.insert("DiskUsage".to_owned(), None);
        metrics.insert("CPUUsage".to_owned(), Some(12.5));
        let row = ReportRow {
            index: 3,
            site: Site::new("s1", "e1", "DC-1"),
            metrics,
            ipv4_port1: Some("10.0.0.1/24".into()),
            ipv4_port2: None,
            error: None,
        };

        let table = Table::from_report(&columns, &[row]);
        assert_eq!(table.headers[8], "CPUUsage");
        assert_eq!(table.headers[9], "DiskUsage");
        assert_eq!(table.headers.len(), 13);
        let cells = &table.rows[0];
        assert_eq!(cells[0].as_deref(), Some("3"));
        assert_eq!(cells[8].as_deref(), Some("12.5"));
        assert_eq!(cells[9], None);
        assert_eq!(cells[10].as_deref(), Some("10.0.0.1/24"));
    }

    #[test]
    fn records_take_union_of_keys() {
        let a = json!({"id": "1", "name": "HQ"});
        let b = json!({"id": "2", "admin_state": "active", "name": null});
        let records: Vec<Map<String, Value>> = [a, b]
            .into_iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect();

        let table = Table::from_records(&records);
        assert_eq!(table.headers, vec!["id", "name", "admin_state"]);
        assert_eq!(table.rows[0][2], None);
        assert_eq!(table.rows[1][1], None);
        assert_eq!(table.rows[1][2].as_deref(), Some("active"));
    }

    #[test]
    fn flattens_one_level() {
        let record = json!({
            "id": "1",
            "location": {"latitude": 1.5, "address": {"city": "X"}},
        });
        let flat = flatten_record(record.as_object().unwrap());
        assert_eq!(flat["id"], json!("1"));
        assert_eq!(flat["location_latitude"], json!(1.5));
        assert_eq!(flat["location_address"], json!({"city": "X"}));
    }

    #[test]
    fn timestamp_prefix() {
        let now = Local.with_ymd_and_hms(2024, 5, 10, 8, 30, 5).unwrap();
        assert_eq!(
            timestamped(REPORT_FILE, now),
            "20240510_083005-site_list_with_resource_metric.csv"
        );
    }
}
