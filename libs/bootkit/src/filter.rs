//! Module-name filtering for discovery passes.
//!
//! A module is scanned iff its name matches the allow pattern and does not
//! match the skip pattern; skip takes precedence. Patterns are compiled once
//! at filter construction and matching never fails afterwards.

use regex::{Regex, RegexBuilder};

use crate::error::DiscoveryError;

/// Default skip pattern: crate-name prefixes of the runtime and common
/// third-party stacks that never export application plugin types. Purely a
/// scan-time optimization; an over-broad skip is corrected by naming the
/// module in `extra_modules`, which bypasses the filter.
pub const DEFAULT_SKIP_PATTERN: &str = "^std|^core$|^alloc|^tokio|^hyper|^axum|^tower|^serde\
|^tracing|^futures|^mio|^regex|^anyhow|^thiserror|^parking_lot|^figment|^inventory";

/// Default allow pattern: everything.
pub const DEFAULT_ALLOW_PATTERN: &str = ".*";

/// Compiled skip/allow pair applied to module names.
#[derive(Debug, Clone)]
pub struct ModuleNameFilter {
    skip: Regex,
    allow: Regex,
}

impl ModuleNameFilter {
    /// Compiles both patterns case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidPattern`] naming the offending
    /// pattern if either fails to compile.
    pub fn new(skip_pattern: &str, allow_pattern: &str) -> Result<Self, DiscoveryError> {
        let compile = |which: &'static str, pattern: &str| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| DiscoveryError::InvalidPattern {
                    which,
                    pattern: pattern.to_owned(),
                    source: Box::new(e),
                })
        };
        Ok(Self {
            skip: compile("skip", skip_pattern)?,
            allow: compile("allow", allow_pattern)?,
        })
    }

    /// Decides whether a named module participates in a scan.
    ///
    /// Empty names never scan. Skip wins over allow. Pure: no side effects,
    /// no errors.
    #[must_use]
    pub fn should_scan(&self, module_name: &str) -> bool {
        if module_name.is_empty() {
            return false;
        }
        if self.skip.is_match(module_name) {
            return false;
        }
        self.allow.is_match(module_name)
    }
}

impl Default for ModuleNameFilter {
    fn default() -> Self {
        // Both defaults are compile-tested below; construction cannot fail.
        match Self::new(DEFAULT_SKIP_PATTERN, DEFAULT_ALLOW_PATTERN) {
            Ok(f) => f,
            Err(_) => unreachable!("default filter patterns are valid"),
        }
    }
}
