use std::{
    fmt,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use cacache::Integrity;

use crate::{
    cache::{CacheError, PreviewCache},
    types::{CacheKey, PreviewImage},
};

/// Root directory for the preview blob store.
///
/// This is a dedicated directory that `cacache` will manage internally
/// (index + content-addressed blobs).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PreviewCacheRoot(PathBuf);

impl PreviewCacheRoot {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Debug for PreviewCacheRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreviewCacheRoot").field(&self.0).finish()
    }
}

/// Minimal metadata returned from a cache index lookup.
#[derive(Debug, Clone)]
pub struct PreviewBlobMeta {
    pub integrity: Integrity,
    pub byte_len: usize,
    pub written_at: SystemTime,
}

/// A thin typed wrapper over `cacache` for JSON-encoded preview images.
#[derive(Clone, Debug)]
pub struct PreviewBlobStore {
    root: PreviewCacheRoot,
}

impl PreviewBlobStore {
    pub fn new(root: PreviewCacheRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &PreviewCacheRoot {
        &self.root
    }

    /// Index key inside the cacache root.
    ///
    /// Versioned so a format change never deserializes stale entries.
    fn index_key(key: &CacheKey) -> String {
        format!("previews/v1/{}", key.as_str())
    }

    pub async fn metadata(&self, key: &CacheKey) -> Result<Option<PreviewBlobMeta>, CacheError> {
        let meta = cacache::metadata(self.root.as_path(), Self::index_key(key))
            .await
            .map_err(|e| CacheError::Io(format!("cacache metadata failed: {e}")))?;

        Ok(meta.map(|m| {
            // `cacache` uses unix millis in `time`.
            let millis = u64::try_from(m.time).unwrap_or(u64::MAX);
            let written_at = UNIX_EPOCH + Duration::from_millis(millis);
            PreviewBlobMeta {
                integrity: m.integrity,
                byte_len: m.size,
                written_at,
            }
        }))
    }

    pub async fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        let r_opts = cacache::index::RemoveOpts::new().remove_fully(true);
        r_opts
            .remove(self.root.as_path(), Self::index_key(key))
            .await
            .map_err(|e| CacheError::Io(format!("cacache remove failed: {e}")))
    }

    async fn read_bytes(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        match cacache::read(self.root.as_path(), Self::index_key(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(cacache::Error::IntegrityError(err)) => Err(CacheError::Integrity(format!(
                "cache entry failed integrity check: {key} ({err})"
            ))),
            Err(cacache::Error::SizeMismatch(wanted, actual)) => Err(CacheError::Integrity(
                format!("cache entry size mismatch: key={key}, wanted={wanted}, actual={actual}"),
            )),
            Err(cacache::Error::IoError(_, msg)) => {
                Err(CacheError::Io(format!("cacache read I/O error: {msg}")))
            }
            Err(cacache::Error::SerdeError(_, msg)) => {
                Err(CacheError::Io(format!("cacache read serde error: {msg}")))
            }
        }
    }
}

#[async_trait]
impl PreviewCache for PreviewBlobStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<PreviewImage>, CacheError> {
        let Some(bytes) = self.read_bytes(key).await? else {
            return Ok(None);
        };

        let image = serde_json::from_slice::<PreviewImage>(&bytes)?;
        Ok(Some(image))
    }

    async fn set(&self, key: &CacheKey, image: &PreviewImage) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(image)?;
        cacache::write(self.root.as_path(), Self::index_key(key), &bytes)
            .await
            .map_err(|e| CacheError::Io(format!("cacache write failed: {e}")))?;
        Ok(())
    }
}
