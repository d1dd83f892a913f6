//! Runtime configuration for the attachment pipeline.
//!
//! Both remote services are configured from the environment. Parsing goes
//! through a lookup closure so it can be exercised without touching the
//! process environment.

use std::env;

use crate::records::RecordStoreConfig;
use crate::storage::R2Config;
use crate::{Error, Result};

/// Configuration for both remote services the pipeline talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub storage: R2Config,
    pub records: RecordStoreConfig,
}

impl PipelineConfig {
    /// Load the full pipeline configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let storage = R2Config::from_lookup(&lookup)?.ok_or_else(|| {
            Error::InvalidInput(
                "Object storage is not configured. Set R2_ACCOUNT_ID, R2_BUCKET, R2_ACCESS_KEY_ID and R2_SECRET_ACCESS_KEY."
                    .to_string(),
            )
        })?;
        let records = RecordStoreConfig::from_lookup(&lookup)?.ok_or_else(|| {
            Error::InvalidInput("Record store is not configured. Set RECORD_STORE_URL.".to_string())
        })?;
        Ok(Self { storage, records })
    }
}
