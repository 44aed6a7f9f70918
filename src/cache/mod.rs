//! Persistent preview cache.
//!
//! This module provides the key-value contract the resolution service talks
//! to, plus a typed facade around `cacache` for integrity-checked on-disk
//! storage.

pub mod blob_store;

pub use blob_store::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{CacheKey, PreviewImage};

/// Failures of the persistent cache backend.
///
/// Every variant is recoverable: the service logs a warning and falls
/// through (read failures become misses, write failures leave the built
/// image unpersisted but still returned).
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(String),

    #[error("cache entry failed integrity check: {0}")]
    Integrity(String),

    #[error("cache entry could not be encoded or decoded: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Key-value store mapping [`CacheKey`] to [`PreviewImage`].
///
/// The store has its own lifecycle and may fail independently of the
/// resolution logic; a missing entry is `Ok(None)`, not an error.
#[async_trait]
pub trait PreviewCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<PreviewImage>, CacheError>;

    async fn set(&self, key: &CacheKey, image: &PreviewImage) -> Result<(), CacheError>;
}
