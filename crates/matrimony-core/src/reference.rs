//! Object-storage reference validation.
//!
//! Stored records may carry legacy values that never pointed at our bucket:
//! empty strings, half-written uploads, arbitrary external links. Anything that
//! does not match one of the accepted reference shapes is dropped before it
//! reaches the screen.

use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::storage::R2Config;
use crate::util::is_http_url;

/// Reference shapes accepted by [`ReferenceValidator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceShape {
    /// `https://{account}.r2.cloudflarestorage.com/{bucket}/{key}`
    BucketObject,
    /// `{public_base_url}/{key}`
    DirectHost,
}

/// Predicate deciding whether a value is a reference into the configured bucket.
#[derive(Debug, Clone)]
pub struct ReferenceValidator {
    bucket_object: Regex,
    direct_host: Option<Regex>,
}

impl ReferenceValidator {
    /// Build a validator from the two URL prefixes objects are served under.
    pub fn new(bucket_object_base: &str, direct_host_base: Option<&str>) -> Result<Self> {
        let bucket_object = compile_shape(bucket_object_base)?;
        let direct_host = direct_host_base.map(compile_shape).transpose()?;
        Ok(Self {
            bucket_object,
            direct_host,
        })
    }

    /// Validator accepting the shapes an [`R2Config`] produces.
    pub fn for_r2(config: &R2Config) -> Result<Self> {
        Self::new(
            &config.bucket_object_base(),
            config.public_base_url.as_deref(),
        )
    }

    /// Which accepted shape `value` has, if any.
    #[must_use]
    pub fn classify(&self, value: &str) -> Option<ReferenceShape> {
        if self.bucket_object.is_match(value) {
            return Some(ReferenceShape::BucketObject);
        }
        self.direct_host
            .as_ref()
            .filter(|shape| shape.is_match(value))
            .map(|_| ReferenceShape::DirectHost)
    }

    #[must_use]
    pub fn is_valid(&self, value: &str) -> bool {
        self.classify(value).is_some()
    }

    /// Same as [`Self::is_valid`] for untyped record data; non-strings are invalid.
    #[must_use]
    pub fn is_valid_value(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|value| self.is_valid(value))
    }

    /// Keep only valid references, preserving order.
    #[must_use]
    pub fn filter_valid<S: AsRef<str>>(&self, values: &[S]) -> Vec<String> {
        values
            .iter()
            .map(AsRef::as_ref)
            .filter(|value| self.is_valid(value))
            .map(ToOwned::to_owned)
            .collect()
    }
}

fn compile_shape(base: &str) -> Result<Regex> {
    let base = base.trim().trim_end_matches('/');
    if !is_http_url(base) {
        return Err(Error::InvalidInput(format!(
            "Reference base must start with http:// or https://: {base}"
        )));
    }
    // The key must be non-empty and free of whitespace and the legacy list delimiter.
    Regex::new(&format!(r"^{}/[^\s,/][^\s,]*$", regex::escape(base)))
        .map_err(|error| Error::InvalidInput(format!("Invalid reference pattern: {error}")))
}
