use sitepulse_api::InterfaceResponse;

/// A port on an element, reduced to what filtering and address
/// resolution need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub id: String,
    /// Port label, usually numeric (`"1"`, `"13"`).
    pub name: String,
    /// IPv4 assignment mode (`"static"`, `"dhcp"`, ...).
    pub ipv4_mode: Option<String>,
    pub ipv4_address: Option<String>,
}

impl Interface {
    /// The configured address, only when the port is statically addressed.
    pub fn static_address(&self) -> Option<&str> {
        match self.ipv4_mode.as_deref() {
            Some("static") => self.ipv4_address.as_deref(),
            _ => None,
        }
    }
}

impl From<&InterfaceResponse> for Interface {
    fn from(r: &InterfaceResponse) -> Self {
        let ipv4 = r.ipv4_config.as_ref();
        Self {
            id: r.id.clone(),
            name: r.name.clone().unwrap_or_default(),
            ipv4_mode: ipv4.and_then(|c| c.config_type.clone()),
            ipv4_address: ipv4
                .and_then(|c| c.static_config.as_ref())
                .and_then(|s| s.address.clone()),
        }
    }
}
