//! Cloudflare R2 storage configuration and upload client.

use std::env;

use aws_credential_types::Credentials;
use aws_sdk_s3::{primitives::ByteStream, Client};
use aws_types::region::Region;

use super::BlobStore;
use crate::{Error, Result};

pub(crate) const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
pub(crate) const ENV_BUCKET: &str = "R2_BUCKET";
pub(crate) const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
pub(crate) const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
pub(crate) const ENV_PUBLIC_BASE_URL: &str = "R2_PUBLIC_BASE_URL";

/// Cloudflare R2 configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct R2Config {
    /// Cloudflare account identifier.
    pub account_id: String,
    /// R2 bucket name.
    pub bucket: String,
    /// Access key id for S3-compatible auth.
    pub access_key_id: String,
    /// Secret access key for S3-compatible auth.
    pub secret_access_key: String,
    /// Optional public URL base for serving media.
    pub public_base_url: Option<String>,
}

impl R2Config {
    /// Load R2 configuration from environment variables.
    ///
    /// Returns `Ok(None)` when no R2 variables are set.
    /// Returns an error when only a partial configuration is provided.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        parse_config(lookup)
    }

    /// Cloudflare R2 S3-compatible endpoint URL.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }

    /// Path-style URL prefix for objects in the configured bucket.
    #[must_use]
    pub fn bucket_object_base(&self) -> String {
        format!("{}/{}", self.endpoint_url(), self.bucket)
    }
}

/// R2-backed blob store.
#[derive(Clone, Debug)]
pub struct R2Storage {
    config: R2Config,
    client: Client,
}

impl R2Storage {
    #[must_use]
    pub fn new(config: R2Config) -> Self {
        let client = build_s3_client(&config);
        Self { config, client }
    }

    #[must_use]
    pub const fn config(&self) -> &R2Config {
        &self.config
    }

    /// Check that the configured bucket is reachable with current credentials.
    pub async fn bucket_is_reachable(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|error| storage_error("head_bucket", &self.config.bucket, None, error))?;
        Ok(())
    }

    /// Public URL for an object key, preferring the configured public base.
    #[must_use]
    pub fn object_url(&self, object_key: &str) -> Option<String> {
        let key = object_key.trim().trim_matches('/');
        if key.is_empty() {
            return None;
        }
        let base = self
            .config
            .public_base_url
            .clone()
            .unwrap_or_else(|| self.config.bucket_object_base());
        Some(format!("{base}/{key}"))
    }
}

impl BlobStore for R2Storage {
    async fn upload(&self, object_key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let object_key = normalize_object_key(object_key)?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&object_key)
            .body(ByteStream::from(bytes.to_vec()));

        if let Some(content_type) = normalize_content_type(Some(content_type)) {
            request = request.content_type(content_type);
        }

        request.send().await.map_err(|error| {
            storage_error("put_object", &self.config.bucket, Some(&object_key), error)
        })?;

        tracing::debug!(bucket = %self.config.bucket, key = %object_key, "Uploaded object");
        Ok(())
    }

    async fn resolve_url(&self, object_key: &str) -> Result<String> {
        self.object_url(object_key).ok_or_else(|| {
            Error::InvalidInput("Attachment object_key cannot be empty".to_string())
        })
    }
}

fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<R2Config>> {
    let account_id = lookup(ENV_ACCOUNT_ID).map(|value| value.trim().to_string());
    let bucket = lookup(ENV_BUCKET).map(|value| value.trim().to_string());
    let access_key_id = lookup(ENV_ACCESS_KEY_ID).map(|value| value.trim().to_string());
    let secret_access_key = lookup(ENV_SECRET_ACCESS_KEY).map(|value| value.trim().to_string());
    let public_base_url = lookup(ENV_PUBLIC_BASE_URL).map(|value| value.trim().to_string());

    let any_present = account_id.is_some()
        || bucket.is_some()
        || access_key_id.is_some()
        || secret_access_key.is_some()
        || public_base_url.is_some();

    if !any_present {
        return Ok(None);
    }

    let mut missing = Vec::new();
    let account_id = require(account_id, ENV_ACCOUNT_ID, &mut missing);
    let bucket = require(bucket, ENV_BUCKET, &mut missing);
    let access_key_id = require(access_key_id, ENV_ACCESS_KEY_ID, &mut missing);
    let secret_access_key = require(secret_access_key, ENV_SECRET_ACCESS_KEY, &mut missing);

    let (Some(account_id), Some(bucket), Some(access_key_id), Some(secret_access_key)) =
        (account_id, bucket, access_key_id, secret_access_key)
    else {
        return Err(Error::InvalidInput(format!(
            "R2 configuration is incomplete. Missing: {}",
            missing.join(", ")
        )));
    };

    let public_base_url = normalize_public_base_url(public_base_url)?;

    Ok(Some(R2Config {
        account_id,
        bucket,
        access_key_id,
        secret_access_key,
        public_base_url,
    }))
}

fn require(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    let value = value.filter(|value| !value.is_empty());
    if value.is_none() {
        missing.push(name);
    }
    value
}

fn build_s3_client(config: &R2Config) -> Client {
    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        "matrimony-core-r2-storage",
    );

    let sdk_config = aws_sdk_s3::config::Builder::new()
        .region(Region::new("auto"))
        .credentials_provider(credentials)
        .endpoint_url(config.endpoint_url())
        .force_path_style(true)
        .build();

    Client::from_conf(sdk_config)
}

fn storage_error(
    operation: &str,
    bucket: &str,
    object_key: Option<&str>,
    error: impl std::fmt::Display,
) -> Error {
    let target = object_key.map_or_else(|| bucket.to_string(), |key| format!("{bucket}/{key}"));
    Error::Storage(format!("R2 {operation} failed for {target}: {error}"))
}

fn normalize_object_key(object_key: &str) -> Result<String> {
    let object_key = object_key.trim().trim_matches('/').to_string();
    if object_key.is_empty() {
        return Err(Error::InvalidInput(
            "Attachment object_key cannot be empty".to_string(),
        ));
    }
    Ok(object_key)
}

fn normalize_content_type(content_type: Option<&str>) -> Option<String> {
    content_type
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn normalize_public_base_url(public_base_url: Option<String>) -> Result<Option<String>> {
    let Some(value) = public_base_url else {
        return Ok(None);
    };

    if value.is_empty() {
        return Ok(None);
    }
    if !value.starts_with("https://") && !value.starts_with("http://") {
        return Err(Error::InvalidInput(
            "R2_PUBLIC_BASE_URL must start with http:// or https://".to_string(),
        ));
    }

    Ok(Some(value.trim_end_matches('/').to_string()))
}
