//! In-process blob store, primarily for tests and dry runs.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::BlobStore;
use crate::{Error, Result};

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Blob store that keeps objects in memory and serves them under `base_url`.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    base_url: String,
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
    failing_calls: Arc<Mutex<HashSet<usize>>>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    latency: Option<Duration>,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            objects: Arc::default(),
            failing_calls: Arc::default(),
            calls: Arc::default(),
            in_flight: Arc::default(),
            peak_in_flight: Arc::default(),
            latency: None,
        }
    }

    /// Make the `call`-th upload (1-based, counted across the store's lifetime) fail.
    #[must_use]
    pub fn failing_upload(self, call: usize) -> Self {
        self.failing_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(call);
        self
    }

    /// Delay every upload by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of upload attempts so far, failed ones included.
    #[must_use]
    pub fn upload_attempts(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Largest number of uploads that were running at the same time.
    #[must_use]
    pub fn peak_concurrent_uploads(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Keys of stored objects in lexical order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn object(&self, object_key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(object_key)
            .cloned()
    }
}

impl BlobStore for MemoryBlobStore {
    async fn upload(&self, object_key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let active = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(active, Ordering::SeqCst);
        let result = self.store_object(call, object_key, bytes, content_type).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn resolve_url(&self, object_key: &str) -> Result<String> {
        let known = self
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(object_key);
        if !known {
            return Err(Error::Storage(format!("No such object: {object_key}")));
        }
        Ok(format!("{}/{object_key}", self.base_url))
    }
}

impl MemoryBlobStore {
    async fn store_object(
        &self,
        call: usize,
        object_key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let should_fail = self
            .failing_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&call);
        if should_fail {
            return Err(Error::Storage(format!(
                "Injected failure for upload #{call} ({object_key})"
            )));
        }

        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                object_key.to_string(),
                StoredObject {
                    bytes: bytes.to_vec(),
                    content_type: content_type.to_string(),
                },
            );
        Ok(())
    }
}
