//! Remote user-record store boundary.

mod memory;
mod rest;

use std::future::Future;

use serde_json::Value;

pub use memory::MemoryRecordStore;
pub use rest::{RecordStoreConfig, RestRecordStore};

use crate::models::{RecordPatch, UserId};
use crate::Result;

/// Key-value store holding one JSON record per user.
pub trait RecordStore: Send + Sync {
    /// Read the raw record, or `None` when no record exists for `user_id`.
    fn fetch(&self, user_id: &UserId) -> impl Future<Output = Result<Option<Value>>> + Send;

    /// Merge `patch` into the record without touching other fields.
    fn patch(&self, user_id: &UserId, patch: &RecordPatch)
        -> impl Future<Output = Result<()>> + Send;
}
