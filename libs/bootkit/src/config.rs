//! Configuration for discovery passes and for the startups they produce.
//!
//! Two distinct mechanisms:
//!
//! 1. [`DiscoveryConfig`] — the host-facing knobs of the discovery pipeline
//!    itself, loadable from a layered `figment` profile.
//! 2. [`ConfigProvider`] — raw JSON sections handed to each startup's
//!    `configure_services`, with a lenient accessor (defaults when the
//!    section is missing) and a strict one (errors when it is).

use std::collections::HashMap;
use std::path::PathBuf;

use figment::providers::Serialized;
use figment::Figment;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::filter::{DEFAULT_ALLOW_PATTERN, DEFAULT_SKIP_PATTERN};

/// Knobs of the discovery pipeline. Every field has a default so an absent
/// `discovery` section means "scan everything loaded".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Modules matching this are never scanned. Case-insensitive regex.
    pub skip_pattern: String,
    /// Only modules matching this are scanned. Case-insensitive regex.
    pub allow_pattern: String,
    /// Enumerate registry-loaded modules at all.
    pub scan_loaded: bool,
    /// Modules force-loaded on every pass, bypassing the filter.
    pub extra_modules: Vec<String>,
    /// Directory scanned for `*.module.json` plugin manifests.
    pub plugin_dir: Option<PathBuf>,
    /// Perform the plugin-directory scan on first enumeration.
    pub ensure_plugin_dir: bool,
    /// Skip (rather than fail on) modules whose types cannot be enumerated.
    pub ignore_scan_errors: bool,
    /// Treat malformed plugin-directory files as fatal.
    pub strict_plugin_files: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            skip_pattern: DEFAULT_SKIP_PATTERN.to_owned(),
            allow_pattern: DEFAULT_ALLOW_PATTERN.to_owned(),
            scan_loaded: true,
            extra_modules: Vec::new(),
            plugin_dir: None,
            ensure_plugin_dir: true,
            ignore_scan_errors: true,
            strict_plugin_files: false,
        }
    }
}

impl DiscoveryConfig {
    /// Extracts the `discovery` section of a layered figment, with defaults
    /// filling anything the profile leaves out.
    ///
    /// # Errors
    ///
    /// Returns the figment error if the section exists but does not
    /// deserialize.
    pub fn from_figment(figment: &Figment) -> Result<Self, Box<figment::Error>> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(figment.focus("discovery"))
            .extract()
            .map_err(Box::new)
    }
}

/// Configuration error for typed section access.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("section '{section}' not found")]
    SectionNotFound { section: String },

    #[error("invalid config in section '{section}': {source}")]
    InvalidSection {
        section: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Provider of per-startup configuration (raw JSON sections only).
pub trait ConfigProvider: Send + Sync {
    /// Returns the raw JSON section for the given name, if any.
    fn section(&self, name: &str) -> Option<&serde_json::Value>;
}

/// Lenient typed accessor: a missing section yields `T::default()`, an
/// invalid one is still an error.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSection`] if the section exists but cannot
/// be deserialized.
pub fn section_or_default<T: DeserializeOwned + Default>(
    provider: &dyn ConfigProvider,
    name: &str,
) -> Result<T, ConfigError> {
    let Some(raw) = provider.section(name) else {
        return Ok(T::default());
    };
    serde_json::from_value(raw.clone()).map_err(|e| ConfigError::InvalidSection {
        section: name.to_owned(),
        source: e,
    })
}

/// Strict typed accessor: the section must exist and deserialize.
///
/// # Errors
///
/// Returns [`ConfigError::SectionNotFound`] if the section is absent and
/// [`ConfigError::InvalidSection`] if it cannot be deserialized.
pub fn section_required<T: DeserializeOwned>(
    provider: &dyn ConfigProvider,
    name: &str,
) -> Result<T, ConfigError> {
    let raw = provider
        .section(name)
        .ok_or_else(|| ConfigError::SectionNotFound {
            section: name.to_owned(),
        })?;
    serde_json::from_value(raw.clone()).map_err(|e| ConfigError::InvalidSection {
        section: name.to_owned(),
        source: e,
    })
}

/// Map-backed [`ConfigProvider`].
#[derive(Debug, Default, Clone)]
pub struct JsonConfig {
    sections: HashMap<String, serde_json::Value>,
}

impl JsonConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_section(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.sections.insert(name.into(), value);
        self
    }
}

impl ConfigProvider for JsonConfig {
    fn section(&self, name: &str) -> Option<&serde_json::Value> {
        self.sections.get(name)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize, Default)]
    struct TestSection {
        #[serde(default)]
        node_name: String,
        #[serde(default)]
        timeout_ms: u64,
    }

    fn provider() -> JsonConfig {
        JsonConfig::new()
            .with_section(
                "node_status",
                json!({ "node_name": "alpha", "timeout_ms": 500 }),
            )
            .with_section("broken", json!({ "timeout_ms": "not a number" }))
    }

    #[test]
    fn lenient_access_parses_present_section() {
        let cfg: TestSection = section_or_default(&provider(), "node_status").unwrap();
        assert_eq!(cfg.node_name, "alpha");
        assert_eq!(cfg.timeout_ms, 500);
    }

    #[test]
    fn lenient_access_defaults_missing_section() {
        let cfg: TestSection = section_or_default(&provider(), "absent").unwrap();
        assert_eq!(cfg, TestSection::default());
    }

    #[test]
    fn lenient_access_still_rejects_invalid_section() {
        let result: Result<TestSection, _> = section_or_default(&provider(), "broken");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSection { section, .. }) if section == "broken"
        ));
    }

    #[test]
    fn strict_access_requires_the_section() {
        let result: Result<TestSection, _> = section_required(&provider(), "absent");
        assert!(matches!(
            result,
            Err(ConfigError::SectionNotFound { section }) if section == "absent"
        ));
    }

    #[test]
    fn strict_access_parses_present_section() {
        let cfg: TestSection = section_required(&provider(), "node_status").unwrap();
        assert_eq!(cfg.node_name, "alpha");
    }

    #[test]
    fn discovery_defaults_scan_everything_loaded() {
        let cfg = DiscoveryConfig::default();
        assert!(cfg.scan_loaded);
        assert!(cfg.ignore_scan_errors);
        assert!(!cfg.strict_plugin_files);
        assert!(cfg.extra_modules.is_empty());
        assert_eq!(cfg.allow_pattern, DEFAULT_ALLOW_PATTERN);
    }

    #[test]
    fn discovery_config_layers_over_defaults_from_figment() {
        let figment = Figment::from(Serialized::defaults(json!({
            "discovery": {
                "allow_pattern": "^app",
                "extra_modules": ["node_status"],
                "plugin_dir": "/opt/plugins"
            }
        })));
        let cfg = DiscoveryConfig::from_figment(&figment).unwrap();
        assert_eq!(cfg.allow_pattern, "^app");
        assert_eq!(cfg.extra_modules, ["node_status"]);
        assert_eq!(cfg.plugin_dir, Some(PathBuf::from("/opt/plugins")));
        // Untouched fields keep their defaults.
        assert_eq!(cfg.skip_pattern, DEFAULT_SKIP_PATTERN);
        assert!(cfg.scan_loaded);
    }

    #[test]
    fn empty_figment_yields_defaults() {
        let cfg = DiscoveryConfig::from_figment(&Figment::new()).unwrap();
        assert_eq!(cfg.skip_pattern, DiscoveryConfig::default().skip_pattern);
    }
}
