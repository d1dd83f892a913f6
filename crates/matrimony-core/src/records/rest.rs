//! JSON-over-HTTP record store client.
//!
//! Records live at `{base}/{collection}/{user_id}.json`; a `null` body means
//! the record does not exist. Writes are `PATCH` requests carrying only the
//! changed fields.

use std::env;

use serde_json::Value;

use super::RecordStore;
use crate::models::{RecordPatch, UserId};
use crate::util::{compact_text, is_http_url, normalize_text_option};
use crate::{Error, Result};

pub(crate) const ENV_RECORD_STORE_URL: &str = "RECORD_STORE_URL";
pub(crate) const ENV_RECORD_STORE_AUTH_TOKEN: &str = "RECORD_STORE_AUTH_TOKEN";
pub(crate) const ENV_RECORD_STORE_COLLECTION: &str = "RECORD_STORE_COLLECTION";

const DEFAULT_COLLECTION: &str = "Matrimony/users";

/// Record store endpoint configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct RecordStoreConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub collection: String,
}

impl std::fmt::Debug for RecordStoreConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RecordStoreConfig")
            .field("base_url", &self.base_url)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("collection", &self.collection)
            .finish()
    }
}

impl RecordStoreConfig {
    /// Load record store configuration from environment variables.
    ///
    /// Returns `Ok(None)` when `RECORD_STORE_URL` is unset.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        let Some(base_url) = normalize_text_option(lookup(ENV_RECORD_STORE_URL)) else {
            return Ok(None);
        };
        if !is_http_url(&base_url) {
            return Err(Error::InvalidInput(format!(
                "{ENV_RECORD_STORE_URL} must start with http:// or https://"
            )));
        }
        let collection = normalize_text_option(lookup(ENV_RECORD_STORE_COLLECTION))
            .map_or_else(
                || DEFAULT_COLLECTION.to_string(),
                |value| value.trim_matches('/').to_string(),
            );
        if collection.is_empty() {
            return Err(Error::InvalidInput(format!(
                "{ENV_RECORD_STORE_COLLECTION} cannot be empty"
            )));
        }

        Ok(Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: normalize_text_option(lookup(ENV_RECORD_STORE_AUTH_TOKEN)),
            collection,
        }))
    }
}

/// HTTP client for the remote user-record store.
#[derive(Debug, Clone)]
pub struct RestRecordStore {
    config: RecordStoreConfig,
    client: reqwest::Client,
}

impl RestRecordStore {
    pub fn new(config: RecordStoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { config, client })
    }

    fn record_url(&self, user_id: &UserId) -> String {
        let mut url = format!(
            "{}/{}/{}.json",
            self.config.base_url,
            self.config.collection,
            urlencoding::encode(user_id.as_str())
        );
        if let Some(token) = &self.config.auth_token {
            url.push_str("?auth=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }
}

impl RecordStore for RestRecordStore {
    async fn fetch(&self, user_id: &UserId) -> Result<Option<Value>> {
        let response = self
            .client
            .get(self.record_url(user_id))
            .header("Accept", "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Record(format!(
                "Fetch for {user_id} failed with HTTP {status}: {}",
                compact_text(&body)
            )));
        }

        let record = response.json::<Value>().await?;
        Ok(match record {
            Value::Null => None,
            record => Some(record),
        })
    }

    async fn patch(&self, user_id: &UserId, patch: &RecordPatch) -> Result<()> {
        let response = self
            .client
            .patch(self.record_url(user_id))
            .header("Accept", "application/json")
            .json(patch.fields())
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Record(format!(
                "Patch for {user_id} failed with HTTP {status}: {}",
                compact_text(&body)
            )));
        }
        Ok(())
    }
}
