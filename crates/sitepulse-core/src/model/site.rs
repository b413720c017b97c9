use serde::{Deserialize, Serialize};
use sitepulse_api::ElementResponse;

/// One element-bearing site from the inventory.
///
/// Immutable once fetched; the batch holds it by value in every row it
/// produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub site_id: String,
    pub element_id: String,
    pub name: String,
    pub model_name: Option<String>,
    pub serial_number: Option<String>,
    pub software_version: Option<String>,
    pub hw_id: Option<String>,
}

impl Site {
    /// A site with only its identity set.
    pub fn new(
        site_id: impl Into<String>,
        element_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            site_id: site_id.into(),
            element_id: element_id.into(),
            name: name.into(),
            model_name: None,
            serial_number: None,
            software_version: None,
            hw_id: None,
        }
    }
}

impl From<ElementResponse> for Site {
    fn from(e: ElementResponse) -> Self {
        Self {
            site_id: e.site_id,
            element_id: e.id,
            name: e.name.unwrap_or_default(),
            model_name: e.model_name,
            serial_number: e.serial_number,
            software_version: e.software_version,
            hw_id: e.hw_id,
        }
    }
}
