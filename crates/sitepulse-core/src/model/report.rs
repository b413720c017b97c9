use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::Site;

/// The flattened summary of one site.
///
/// Metric columns are always present; a failed site carries `None` in every
/// one of them and the failure message in `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Position of the site in the batch input.
    pub index: usize,
    pub site: Site,
    pub metrics: IndexMap<String, Option<f64>>,
    pub ipv4_port1: Option<String>,
    pub ipv4_port2: Option<String>,
    pub error: Option<String>,
}

impl ReportRow {
    /// Placeholder row for a site whose processing failed.
    pub fn failed(index: usize, site: Site, columns: &[String], error: impl Into<String>) -> Self {
        Self {
            index,
            site,
            metrics: columns.iter().map(|c| (c.clone(), None)).collect(),
            ipv4_port1: None,
            ipv4_port2: None,
            error: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied().flatten()
    }
}
