//! Instrumented doubles for the preview cache and builder contracts.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context, Poll, Waker},
    time::Duration,
};

use async_trait::async_trait;
use preview_images::{
    CacheError, CacheKey, PreviewBuilder, PreviewCache, PreviewError, PreviewImage,
};
use tokio::sync::Semaphore;

/// Drive a future one step without a real waker, for tests that need to
/// pin down a specific interleaving of callers.
pub fn poll_once<F: Future>(fut: &mut Pin<Box<F>>) -> Poll<F::Output> {
    fut.as_mut().poll(&mut Context::from_waker(Waker::noop()))
}

pub fn preview(width: u32) -> PreviewImage {
    PreviewImage {
        original_width: width,
        original_height: width * 3 / 4,
        data_uri_base64: format!("data:image/svg+xml;base64,dGVzdC1{width}"),
    }
}

/// In-memory cache with get/set counters.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, PreviewImage>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl MemoryCache {
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn insert(&self, key: CacheKey, image: PreviewImage) {
        self.entries.lock().expect("cache entries").insert(key, image);
    }

    pub fn clear(&self) {
        self.entries.lock().expect("cache entries").clear();
    }
}

#[async_trait]
impl PreviewCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<PreviewImage>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.lock().expect("cache entries").get(key).cloned())
    }

    async fn set(&self, key: &CacheKey, image: &PreviewImage) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .expect("cache entries")
            .insert(key.clone(), image.clone());
        Ok(())
    }
}

/// Cache whose get and set always fail, as if the backend were down.
#[derive(Default)]
pub struct BrokenCache {
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl BrokenCache {
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PreviewCache for BrokenCache {
    async fn get(&self, _key: &CacheKey) -> Result<Option<PreviewImage>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &CacheKey, _image: &PreviewImage) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

/// Builder that blocks inside `build` until the test releases its gate.
pub struct GatedBuilder {
    calls: AtomicUsize,
    gate: Arc<Semaphore>,
}

impl GatedBuilder {
    pub fn new() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let builder = Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: Arc::clone(&gate),
        });
        (builder, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PreviewBuilder for GatedBuilder {
    async fn build(&self, _url: &str) -> Result<PreviewImage, PreviewError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self.gate.acquire().await.expect("gate closed");
        permit.forget();
        Ok(preview(640))
    }
}

/// Builder that records the high-water mark of simultaneous builds.
#[derive(Default)]
pub struct GaugedBuilder {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl GaugedBuilder {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PreviewBuilder for GaugedBuilder {
    async fn build(&self, _url: &str) -> Result<PreviewImage, PreviewError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        // Keep the build pending long enough for the batch to overlap work.
        tokio::time::sleep(Duration::from_millis(2)).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(preview(320))
    }
}

/// Builder that fails for URLs containing a marker substring.
pub struct FailingBuilder {
    pub fail_marker: &'static str,
}

#[async_trait]
impl PreviewBuilder for FailingBuilder {
    async fn build(&self, url: &str) -> Result<PreviewImage, PreviewError> {
        if url.contains(self.fail_marker) {
            return Err(PreviewError::Build(format!("refusing to build {url}")));
        }
        Ok(preview(480))
    }
}
