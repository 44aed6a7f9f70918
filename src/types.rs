use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use url::Url;

/// Normalized identity of an image resource.
///
/// This is both the persistent cache storage key and the in-flight
/// deduplication key. Two source URLs that normalize to the same key are the
/// same logical resource and are resolved at most once per batch.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacheKey").field(&self.0).finish()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the canonical [`CacheKey`] for a source URL.
///
/// Deterministic and total: well-formed URLs get their query and fragment
/// stripped (the parser already lowercases scheme and host), plus any
/// trailing slashes; anything unparseable falls back to the trimmed,
/// lowercased raw string so a malformed entry can never fail a batch.
pub fn cache_key_for(url: &str) -> CacheKey {
    let trimmed = url.trim();
    match Url::parse(trimmed) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            let canonical = parsed.to_string();
            CacheKey(canonical.trim_end_matches('/').to_string())
        }
        Err(_) => CacheKey(trimmed.to_ascii_lowercase()),
    }
}

/// Low-resolution inline placeholder for a single source image.
///
/// Immutable once constructed; either persisted to the preview cache or
/// discarded. Field names on the wire match the JSON the upstream consumers
/// expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewImage {
    pub original_width: u32,
    pub original_height: u32,
    #[serde(rename = "dataURIBase64")]
    pub data_uri_base64: String,
}

/// One entry per distinct cache key requested in a batch; `None` marks a key
/// whose resolution failed.
pub type PreviewImageMap = HashMap<CacheKey, Option<PreviewImage>>;

/// Anything that can enumerate the image URLs referenced by a document.
///
/// URL extraction itself lives with the document model; implementations may
/// return duplicates and empty strings, both of which the batch resolver
/// tolerates.
pub trait ImageUrlSource {
    fn image_urls(&self) -> Vec<String>;
}
