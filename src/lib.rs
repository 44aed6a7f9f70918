//! # Preview Images
//!
//! Cached, deduplicated resolution of page image URLs into small preview
//! descriptors (original dimensions plus an inline low-resolution
//! placeholder).
//!
//! ## Overview
//!
//! Given the image URLs referenced by a document, [`PreviewImageService`]
//! produces a mapping from each URL's canonical cache key to a
//! [`PreviewImage`], combining three concerns:
//!
//! - **Bounded fan-out**: batches resolve with at most a configurable number
//!   of simultaneously pending resolutions (8 by default)
//! - **Singleflight memoization**: concurrent requests for the same key
//!   collapse into a single cache-read/build/cache-write sequence,
//!   process-wide
//! - **Soft-failing cache**: persistent cache errors degrade to misses or
//!   unpersisted results, never to a failed batch
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use preview_images::{
//!     PreviewBlobStore, PreviewCacheRoot, PreviewConfig, PreviewImageService,
//! };
//!
//! # async fn run() {
//! let store = PreviewBlobStore::new(PreviewCacheRoot::new("./cache/previews".into()));
//! let service = PreviewImageService::new(Arc::new(store), PreviewConfig::default());
//!
//! let previews = service
//!     .preview_image_map(["https://example.com/cover.png"])
//!     .await;
//! # let _ = previews;
//! # }
//! ```

#![allow(missing_docs)]

/// Persistent preview cache contract and the cacache-backed store
pub mod cache;

/// Process-wide service configuration
pub mod config;

/// Preview synthesis on cache miss
pub mod builder;

/// Error types and the crate-wide `Result` alias
pub mod error;

/// Batch resolution and per-key memoization
pub mod service;

/// Core data model: keys, descriptors, and the result map
pub mod types;

pub use builder::{PlaceholderBuilder, PreviewBuilder};
pub use cache::{CacheError, PreviewBlobStore, PreviewCache, PreviewCacheRoot};
pub use config::PreviewConfig;
pub use error::{PreviewError, Result};
pub use service::PreviewImageService;
pub use types::{CacheKey, ImageUrlSource, PreviewImage, PreviewImageMap, cache_key_for};
