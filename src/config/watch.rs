//! `[watch]` section configuration.
//!
//! Watcher backend and dependency-resolution settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// `[watch]` section in pagewatch.toml.
///
/// # Example
/// ```toml
/// [watch]
/// poll = true         # use the polling backend
/// interval = 250      # poll interval in ms
/// max_depth = 10
/// gallery = "gallery.pug"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Poll interval in milliseconds (polling backend only).
    #[serde(default = "defaults::watch::interval")]
    #[educe(Default = defaults::watch::interval())]
    pub interval: u64,

    /// Use the polling backend instead of native notifications.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub poll: bool,

    /// Recursion bound when following dependents of dependents.
    #[serde(default = "defaults::watch::max_depth")]
    #[educe(Default = defaults::watch::max_depth())]
    pub max_depth: usize,

    /// The gallery page, relative to the source root.
    #[serde(default = "defaults::watch::gallery")]
    #[educe(Default = defaults::watch::gallery())]
    pub gallery: PathBuf,

    /// Inline marker making a page depend on the gallery page.
    #[serde(default = "defaults::watch::gallery_marker")]
    #[educe(Default = defaults::watch::gallery_marker())]
    pub gallery_marker: String,
}

impl WatchConfig {
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::{path::PathBuf, time::Duration};

    #[test]
    fn test_watch_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.watch.poll_interval(), Duration::from_millis(100));
        assert!(!config.watch.poll);
        assert_eq!(config.watch.max_depth, 10);
        assert_eq!(config.watch.gallery, PathBuf::from("gallery.pug"));
        assert_eq!(config.watch.gallery_marker, "intoGallery");
    }

    #[test]
    fn test_watch_config_partial_override() {
        let config = r#"
            [watch]
            poll = true
            max_depth = 4
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert!(config.watch.poll);
        assert_eq!(config.watch.max_depth, 4);
        assert_eq!(config.watch.interval, 100);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [watch]
            debounce = 300
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);
        assert!(result.is_err());
    }
}
