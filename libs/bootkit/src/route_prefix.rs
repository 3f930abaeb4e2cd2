//! Route-prefix convention.
//!
//! Combines a configured prefix template with route templates: a route with
//! no template gets the prefix, an absolute template (leading `/`) overrides
//! it, and a relative one is appended after the prefix.

use axum::Router;

/// A normalized route prefix: leading slash, no trailing slash. An empty
/// template means "no prefix".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePrefix {
    template: String,
}

impl RoutePrefix {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        let raw = template.into();
        let trimmed = raw.trim_matches('/');
        let template = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        Self { template }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.template.is_empty()
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Combines the prefix with an existing route template.
    #[must_use]
    pub fn combine(&self, existing: Option<&str>) -> String {
        match existing {
            None | Some("") => self.template.clone(),
            // An absolute template opts out of the prefix.
            Some(abs) if abs.starts_with('/') => abs.to_owned(),
            Some(rel) => format!("{}/{}", self.template, rel.trim_start_matches('/')),
        }
    }

    /// Nests a composed router under the prefix. An empty prefix returns
    /// the router unchanged.
    #[must_use]
    pub fn mount(&self, router: Router) -> Router {
        if self.is_empty() {
            return router;
        }
        Router::new().nest(&self.template, router)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn template_is_normalized() {
        assert_eq!(RoutePrefix::new("api/v1/").template(), "/api/v1");
        assert_eq!(RoutePrefix::new("/api/v1").template(), "/api/v1");
        assert_eq!(RoutePrefix::new("").template(), "");
        assert_eq!(RoutePrefix::new("/").template(), "");
    }

    #[test]
    fn missing_template_gets_the_prefix() {
        let prefix = RoutePrefix::new("api");
        assert_eq!(prefix.combine(None), "/api");
        assert_eq!(prefix.combine(Some("")), "/api");
    }

    #[test]
    fn absolute_template_overrides_the_prefix() {
        let prefix = RoutePrefix::new("api");
        assert_eq!(prefix.combine(Some("/health")), "/health");
    }

    #[test]
    fn relative_template_is_appended_after_the_prefix() {
        let prefix = RoutePrefix::new("api/v1");
        assert_eq!(prefix.combine(Some("status")), "/api/v1/status");
    }

    #[test]
    fn empty_prefix_combines_to_the_existing_template() {
        let prefix = RoutePrefix::new("");
        assert_eq!(prefix.combine(Some("status")), "/status");
        assert_eq!(prefix.combine(Some("/status")), "/status");
    }
}
