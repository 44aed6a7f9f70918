use std::{
    any::type_name_of_val,
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
};

use futures::{
    FutureExt,
    future::{self, BoxFuture, Shared},
};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::{
    builder::{PlaceholderBuilder, PreviewBuilder},
    cache::{CacheError, PreviewCache},
    config::PreviewConfig,
    types::{CacheKey, ImageUrlSource, PreviewImage, PreviewImageMap, cache_key_for},
};

type SharedResolution = Shared<BoxFuture<'static, Option<PreviewImage>>>;

/// Per-key resolution state in the process-wide memo table.
///
/// A key is either unrequested (absent), in flight (`Pending`, with a shared
/// future every concurrent caller attaches to), or done (`Completed`, served
/// from memory without re-reading the persistent cache).
enum MemoEntry {
    Pending(SharedResolution),
    Completed(Option<PreviewImage>),
}

/// Resolves source image URLs to cached preview images.
///
/// Cloning is cheap and every clone shares the same memo table, so
/// deduplication spans all callers and all batches for the lifetime of the
/// process.
#[derive(Clone)]
pub struct PreviewImageService {
    cache: Arc<dyn PreviewCache>,
    builder: Arc<dyn PreviewBuilder>,
    config: Arc<PreviewConfig>,
    memo: Arc<Mutex<HashMap<CacheKey, MemoEntry>>>,
}

impl fmt::Debug for PreviewImageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let memoized = self.memo.lock().map(|memo| memo.len()).unwrap_or(0);

        f.debug_struct("PreviewImageService")
            .field("cache", &type_name_of_val(self.cache.as_ref()))
            .field("builder", &type_name_of_val(self.builder.as_ref()))
            .field("config", &self.config)
            .field("memoized_keys", &memoized)
            .finish()
    }
}

impl PreviewImageService {
    /// Service with the deterministic placeholder builder.
    pub fn new(cache: Arc<dyn PreviewCache>, config: PreviewConfig) -> Self {
        Self::with_builder(cache, Arc::new(PlaceholderBuilder), config)
    }

    pub fn with_builder(
        cache: Arc<dyn PreviewCache>,
        builder: Arc<dyn PreviewBuilder>,
        config: PreviewConfig,
    ) -> Self {
        Self {
            cache,
            builder,
            config: Arc::new(config),
            memo: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Resolve every image URL referenced by `source` plus the configured
    /// fallback icon and cover.
    pub async fn preview_image_map_for(&self, source: &impl ImageUrlSource) -> PreviewImageMap {
        self.preview_image_map(source.image_urls()).await
    }

    /// Resolve a batch of source URLs into a key -> preview mapping.
    ///
    /// Blank entries are dropped, the configured fallback URLs are appended,
    /// and at most `max_concurrent_resolves` resolutions are pending at any
    /// instant within this call. A single URL's failure never fails the
    /// batch; its key maps to `None`.
    pub async fn preview_image_map<I, S>(&self, urls: I) -> PreviewImageMap
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut candidates: Vec<String> = urls.into_iter().map(Into::into).collect();
        candidates.extend(self.config.default_page_icon.iter().cloned());
        candidates.extend(self.config.default_page_cover.iter().cloned());

        let urls: Vec<String> = candidates
            .into_iter()
            .filter(|url| !url.trim().is_empty())
            .collect();

        // Fresh per batch: the cap bounds this call's pressure on the cache
        // backend and the build step.
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_resolves.max(1)));

        let resolutions = urls.into_iter().map(|url| {
            let service = self.clone();
            let permits = Arc::clone(&permits);
            async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .expect("semaphore should not be closed");
                let key = cache_key_for(&url);
                let preview = service.resolve(&url, &key).await;
                (key, preview)
            }
        });

        // Duplicate keys overwrite harmlessly; values are deterministic per
        // key, and the memo table makes the work run once regardless.
        future::join_all(resolutions).await.into_iter().collect()
    }

    /// Resolve a single URL/key pair, deduplicating concurrent callers.
    ///
    /// At most one cache-read/build/cache-write sequence runs per key across
    /// the whole process; concurrent callers attach to the pending shared
    /// future and all observe the same value.
    pub async fn resolve(&self, url: &str, key: &CacheKey) -> Option<PreviewImage> {
        let resolution = {
            let Ok(mut memo) = self.memo.lock() else {
                // Poisoned memo table: resolve unmemoized rather than refuse.
                warn!("preview memo table poisoned; resolving {key} without memoization");
                return self.clone().run_resolution(url.to_string(), key.clone()).await;
            };

            match memo.get(key) {
                Some(MemoEntry::Completed(value)) => return value.clone(),
                Some(MemoEntry::Pending(shared)) => {
                    debug!("singleflight wait: key={key}");
                    shared.clone()
                }
                None => {
                    debug!("singleflight lead: key={key}");
                    let shared = self
                        .clone()
                        .run_resolution(url.to_string(), key.clone())
                        .boxed()
                        .shared();
                    memo.insert(key.clone(), MemoEntry::Pending(shared.clone()));
                    shared
                }
            }
        };

        let value = resolution.clone().await;
        self.complete(key, &resolution, &value);
        value
    }

    /// Transition `Pending -> Completed` once the shared resolution settles.
    ///
    /// With `revalidate_completed` the entry is dropped instead, so the next
    /// caller goes back through the persistent cache. Only the resolution
    /// this caller actually awaited may transition the entry: a waiter from
    /// an earlier generation must not clobber a newer in-flight resolution
    /// that claimed the key after a revalidating removal.
    fn complete(
        &self,
        key: &CacheKey,
        resolution: &SharedResolution,
        value: &Option<PreviewImage>,
    ) {
        let Ok(mut memo) = self.memo.lock() else {
            return;
        };
        let settled_current = matches!(
            memo.get(key),
            Some(MemoEntry::Pending(current)) if current.ptr_eq(resolution)
        );
        if settled_current {
            if self.config.revalidate_completed {
                memo.remove(key);
            } else {
                memo.insert(key.clone(), MemoEntry::Completed(value.clone()));
            }
        }
    }

    /// The actual per-key work: cache read, build on miss, best-effort write.
    ///
    /// Cache failures on either side are soft; only a failed build yields
    /// `None`.
    async fn run_resolution(self, url: String, key: CacheKey) -> Option<PreviewImage> {
        if let Some(Some(cached)) = soft_cache_failure(self.cache.get(&key).await, &key, "get") {
            return Some(cached);
        }

        let image = match self.builder.build(&url).await {
            Ok(image) => image,
            Err(err) => {
                warn!("failed to create preview image for \"{url}\": {err}");
                return None;
            }
        };

        let _ = soft_cache_failure(self.cache.set(&key, &image).await, &key, "set");

        Some(image)
    }
}

/// Log-and-fall-through consumption of a cache result.
///
/// Both cache call sites route through here so the degraded path stays
/// explicit: a read failure becomes a miss, a write failure leaves the image
/// unpersisted but returned.
fn soft_cache_failure<T>(
    result: Result<T, CacheError>,
    key: &CacheKey,
    op: &'static str,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("preview cache {op} failed for \"{key}\": {err}");
            None
        }
    }
}
