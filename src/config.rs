use std::env;

use serde::Deserialize;

/// Default cap on simultaneously pending resolutions within one batch call.
pub const DEFAULT_MAX_CONCURRENT_RESOLVES: usize = 8;

/// Process-wide settings for the preview image service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Fallback icon URL appended to every batch before resolution.
    pub default_page_icon: Option<String>,

    /// Fallback cover URL appended to every batch before resolution.
    pub default_page_cover: Option<String>,

    /// Upper bound on concurrently pending resolutions per batch call.
    pub max_concurrent_resolves: usize,

    /// When set, completed memo entries are dropped after each resolution so
    /// the next call re-reads the persistent cache instead of serving the
    /// process-wide memoized value. Off by default: a key resolved once in
    /// this process stays served from memory, so out-of-band cache updates
    /// for that key are not observed.
    pub revalidate_completed: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            default_page_icon: None,
            default_page_cover: None,
            max_concurrent_resolves: DEFAULT_MAX_CONCURRENT_RESOLVES,
            revalidate_completed: false,
        }
    }
}

impl PreviewConfig {
    pub fn from_env() -> Self {
        Self {
            default_page_icon: env::var("PREVIEW_DEFAULT_PAGE_ICON").ok(),
            default_page_cover: env::var("PREVIEW_DEFAULT_PAGE_COVER").ok(),
            max_concurrent_resolves: env::var("PREVIEW_MAX_CONCURRENT_RESOLVES")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(DEFAULT_MAX_CONCURRENT_RESOLVES)
                .max(1),
            revalidate_completed: env::var("PREVIEW_REVALIDATE_COMPLETED")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(false),
        }
    }
}
