use crate::error::{CrawlError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which artifacts to capture for every visited page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOptions {
    pub screenshot: bool,
    /// Capture the full scrollable page instead of the viewport
    pub full_page: bool,
    pub pdf: bool,
}

impl CaptureOptions {
    pub fn is_empty(&self) -> bool {
        !self.screenshot && !self.pdf
    }
}

/// Default viewport applied to every tab of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportOptions {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
    /// Take the page's meta viewport tag into account
    pub is_mobile: bool,
    pub has_touch: bool,
    pub is_landscape: bool,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            device_scale_factor: 1.0,
            is_mobile: false,
            has_touch: false,
            is_landscape: false,
        }
    }
}

/// Link filter switches. Every unset option is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub same_origin: bool,
    pub https_only: bool,
    pub relative_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// What a worker does when navigating or capturing a URL fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop the worker; sibling workers and other seeds keep going
    #[default]
    Abort,
    /// Record the failure and move on to the next URL
    Continue,
}

/// Immutable settings for one crawl run, shared by every worker of every seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub tabs: usize,
    pub recursive: bool,
    /// Number of tiers visited when recursive, the seed being tier 0
    pub max_depth: usize,
    pub capture: CaptureOptions,
    pub viewport: ViewportOptions,
    pub filter: FilterOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub javascript_enabled: bool,
    pub failure_policy: FailurePolicy,
    pub output_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_executable: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            tabs: 2,
            recursive: false,
            max_depth: 2,
            capture: CaptureOptions::default(),
            viewport: ViewportOptions::default(),
            filter: FilterOptions::default(),
            user_agent: None,
            javascript_enabled: true,
            failure_policy: FailurePolicy::default(),
            output_dir: PathBuf::from("."),
            chrome_executable: None,
        }
    }
}

impl CrawlConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tabs(mut self, tabs: usize) -> Self {
        self.tabs = tabs;
        self
    }

    pub fn with_recursion(mut self, max_depth: usize) -> Self {
        self.recursive = true;
        self.max_depth = max_depth;
        self
    }

    pub fn with_capture(mut self, capture: CaptureOptions) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_viewport(mut self, viewport: ViewportOptions) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_filter(mut self, filter: FilterOptions) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_javascript(mut self, enabled: bool) -> Self {
        self.javascript_enabled = enabled;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    /// Reject settings no crawl can run with. The link pattern is compiled
    /// separately by [`crate::links::LinkFilter::new`].
    pub fn validate(&self) -> Result<()> {
        if self.tabs == 0 {
            return Err(CrawlError::Config("tab count must be at least 1".into()));
        }
        if self.recursive && self.max_depth == 0 {
            return Err(CrawlError::Config(
                "recursion depth must be at least 1".into(),
            ));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(CrawlError::Config(format!(
                "viewport must be non-empty, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if !(self.viewport.device_scale_factor > 0.0) {
            return Err(CrawlError::Config(format!(
                "device scale factor must be positive, got {}",
                self.viewport.device_scale_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let config = CrawlConfig::default();
        assert_eq!(config.tabs, 2);
        assert!(!config.recursive);
        assert_eq!(config.viewport.width, 1920);
        assert_eq!(config.viewport.height, 1080);
        assert!(config.javascript_enabled);
        assert!(config.capture.is_empty());
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn test_validate_rejects_zero_tabs() {
        let config = CrawlConfig::new().with_tabs(0);
        assert!(matches!(config.validate(), Err(CrawlError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_depth_when_recursive() {
        let config = CrawlConfig::new().with_recursion(0);
        assert!(matches!(config.validate(), Err(CrawlError::Config(_))));
    }

    #[test]
    fn test_validate_ignores_depth_without_recursion() {
        let mut config = CrawlConfig::new();
        config.max_depth = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_viewport() {
        let viewport = ViewportOptions {
            width: 0,
            ..ViewportOptions::default()
        };
        let config = CrawlConfig::new().with_viewport(viewport);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_failure_policy_serializes_kebab_case() {
        let json = serde_json::to_string(&FailurePolicy::Continue).unwrap();
        assert_eq!(json, "\"continue\"");
    }
}
