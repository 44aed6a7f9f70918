use async_trait::async_trait;

use crate::{error::Result, types::PreviewImage};

/// Dimensions reported by the placeholder builder.
pub const PLACEHOLDER_WIDTH: u32 = 800;
pub const PLACEHOLDER_HEIGHT: u32 = 600;

/// Inline SVG payload served as the low-resolution placeholder: a flat
/// 800x600 `#F5F5F5` rectangle, base64-encoded as a data URI.
pub const PLACEHOLDER_DATA_URI: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iODAwIiBoZWlnaHQ9IjYwMCIgdmlld0JveD0iMCAwIDgwMCA2MDAiIGZpbGw9Im5vbmUiIHhtbG5zPSJodHRwOi8vd3d3LnczLm9yZy8yMDAwL3N2ZyI+CjxyZWN0IHdpZHRoPSI4MDAiIGhlaWdodD0iNjAwIiBmaWxsPSIjRjVGNUY1Ii8+Cjwvc3ZnPg==";

/// Synthesizes a [`PreviewImage`] for a source URL on cache miss.
///
/// Implementations must be deterministic for identical input and produce a
/// small, fixed-size payload; beyond that the strategy is open (a real
/// downscaling thumbnailer satisfies the same contract).
#[async_trait]
pub trait PreviewBuilder: Send + Sync {
    async fn build(&self, url: &str) -> Result<PreviewImage>;
}

/// Builder that returns the same deterministic placeholder for every URL.
///
/// Suited to runtimes without access to native image codecs; the real image
/// is never fetched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderBuilder;

#[async_trait]
impl PreviewBuilder for PlaceholderBuilder {
    async fn build(&self, _url: &str) -> Result<PreviewImage> {
        Ok(PreviewImage {
            original_width: PLACEHOLDER_WIDTH,
            original_height: PLACEHOLDER_HEIGHT,
            data_uri_base64: PLACEHOLDER_DATA_URI.to_string(),
        })
    }
}
