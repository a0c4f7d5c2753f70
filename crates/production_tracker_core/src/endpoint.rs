//! crates/production_tracker_core/src/endpoint.rs
//!
//! Decides which remote URL, if any, the bridge should talk to.

/// Deployed Apps Script web apps all live under this origin.
pub const DEFAULT_REQUIRED_PREFIX: &str = "https://script.google.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPolicy {
    pub required_prefix: String,
}

impl Default for EndpointPolicy {
    fn default() -> Self {
        Self {
            required_prefix: DEFAULT_REQUIRED_PREFIX.to_string(),
        }
    }
}

impl EndpointPolicy {
    pub fn new(required_prefix: impl Into<String>) -> Self {
        Self {
            required_prefix: required_prefix.into(),
        }
    }

    /// A URL is plausible when it starts with the required prefix and has no
    /// embedded whitespace. Placeholders such as `PASTE_YOUR_URL_HERE` fail.
    pub fn is_plausible(&self, url: &str) -> bool {
        let url = url.trim();
        url.starts_with(&self.required_prefix) && !url.chars().any(char::is_whitespace)
    }

    /// A saved URL wins over the configured one; implausible candidates are skipped.
    pub fn resolve(&self, saved: Option<&str>, configured: Option<&str>) -> Option<String> {
        [saved, configured]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| self.is_plausible(url))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_url_takes_precedence() {
        let policy = EndpointPolicy::default();
        let saved = "https://script.google.com/macros/s/saved/exec";
        let configured = "https://script.google.com/macros/s/configured/exec";

        assert_eq!(policy.resolve(Some(saved), Some(configured)).as_deref(), Some(saved));
        assert_eq!(
            policy.resolve(Some("not a url"), Some(configured)).as_deref(),
            Some(configured)
        );
    }

    #[test]
    fn placeholders_disable_the_bridge() {
        let policy = EndpointPolicy::default();
        assert_eq!(
            policy.resolve(None, Some("PASTE_YOUR_COPIED_APPS_SCRIPT_URL_HERE")),
            None
        );
        assert!(!policy.is_plausible("http://script.google.com/x"));
    }
}
