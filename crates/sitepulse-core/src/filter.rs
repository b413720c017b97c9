// ── Interface selection ──
//
// Decides which interfaces of a site get a bandwidth sub-query. Rules are
// evaluated in order against the site name; the first match supplies the
// interface-name pattern. Sites matching no rule fall back to port "1".

use regex::Regex;

use crate::error::CoreError;
use crate::model::Interface;

/// Interface-name pattern used when no rule matches the site name.
pub const DEFAULT_INTERFACE_PATTERN: &str = "^1$";

/// One `(site pattern, interface pattern)` pair.
#[derive(Debug, Clone)]
pub struct InterfaceRule {
    site: Regex,
    interfaces: Regex,
}

impl InterfaceRule {
    pub fn new(site_pattern: &str, interface_pattern: &str) -> Result<Self, CoreError> {
        Ok(Self {
            site: compile(site_pattern)?,
            interfaces: compile(interface_pattern)?,
        })
    }

    pub fn site_pattern(&self) -> &str {
        self.site.as_str()
    }

    pub fn interface_pattern(&self) -> &str {
        self.interfaces.as_str()
    }
}

fn compile(pattern: &str) -> Result<Regex, CoreError> {
    Regex::new(pattern).map_err(|e| CoreError::Config {
        message: format!("invalid interface rule pattern {pattern:?}: {e}"),
    })
}

/// Ordered, first-match-wins rule table.
#[derive(Debug, Clone)]
pub struct InterfaceFilter {
    rules: Vec<InterfaceRule>,
    fallback: Regex,
}

impl InterfaceFilter {
    pub fn new(rules: Vec<InterfaceRule>, fallback_pattern: &str) -> Result<Self, CoreError> {
        Ok(Self {
            rules,
            fallback: compile(fallback_pattern)?,
        })
    }

    /// Build from `(site, interfaces)` pattern pairs.
    pub fn from_patterns<'a>(
        rules: impl IntoIterator<Item = (&'a str, &'a str)>,
        fallback_pattern: &str,
    ) -> Result<Self, CoreError> {
        let rules = rules
            .into_iter()
            .map(|(site, interfaces)| InterfaceRule::new(site, interfaces))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(rules, fallback_pattern)
    }

    pub fn rules(&self) -> &[InterfaceRule] {
        &self.rules
    }

    /// Interface-name pattern that applies to `site_name`.
    pub fn pattern_for(&self, site_name: &str) -> &Regex {
        self.rules
            .iter()
            .find(|r| r.site.is_match(site_name))
            .map_or(&self.fallback, |r| &r.interfaces)
    }

    /// Ids of the interfaces to query, in input order. May be empty.
    pub fn select(&self, site_name: &str, interfaces: &[Interface]) -> Vec<String> {
        let pattern = self.pattern_for(site_name);
        interfaces
            .iter()
            .filter(|i| pattern.is_match(&i.name))
            .map(|i| i.id.clone())
            .collect()
    }
}

impl Default for InterfaceFilter {
    /// DCI sites use ports 13 and 14, DC sites port 13. DCI is listed first
    /// because every DCI name also matches the DC rule.
    fn default() -> Self {
        Self {
            rules: vec![
                InterfaceRule {
                    site: builtin(r"^DCI"),
                    interfaces: builtin(r"^(13|14)$"),
                },
                InterfaceRule {
                    site: builtin(r"^DC"),
                    interfaces: builtin(r"^13$"),
                },
            ],
            fallback: builtin(DEFAULT_INTERFACE_PATTERN),
        }
    }
}

#[allow(clippy::expect_used)]
fn builtin(pattern: &'static str) -> Regex {
    Regex::new(pattern).expect("built-in pattern is valid")
}
