//! In-process record store, primarily for tests and dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::{Map, Value};

use super::RecordStore;
use crate::models::{RecordPatch, UserId};
use crate::{Error, Result};

/// Record store holding JSON records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Arc<Mutex<HashMap<UserId, Value>>>,
    patches: Arc<Mutex<Vec<(UserId, Value)>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    latency: Option<Duration>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a raw record.
    pub fn insert(&self, user_id: &UserId, record: Value) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id.clone(), record);
    }

    /// Current raw record.
    #[must_use]
    pub fn record(&self, user_id: &UserId) -> Option<Value> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
    }

    /// Every patch body applied so far, in order.
    #[must_use]
    pub fn patches(&self) -> Vec<(UserId, Value)> {
        self.patches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Toggle failure of every subsequent fetch.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Toggle failure of every subsequent patch.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay every patch by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

impl RecordStore for MemoryRecordStore {
    async fn fetch(&self, user_id: &UserId) -> Result<Option<Value>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Record(format!("Injected read failure for {user_id}")));
        }
        Ok(self.record(user_id))
    }

    async fn patch(&self, user_id: &UserId, patch: &RecordPatch) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Record(format!("Injected write failure for {user_id}")));
        }

        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let record = records
            .entry(user_id.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !record.is_object() {
            *record = Value::Object(Map::new());
        }
        if let Value::Object(fields) = record {
            for (name, value) in patch.fields() {
                if value.is_null() {
                    fields.remove(name);
                } else {
                    fields.insert(name.clone(), value.clone());
                }
            }
        }
        drop(records);

        self.patches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((user_id.clone(), patch.clone().into_json()));
        Ok(())
    }
}
