//! User identity, normalized attachments, and partial record updates

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::attachment::{AttachmentClass, AttachmentValue};
use crate::codec::{encode_biodata, encode_photos};
use crate::error::{Error, Result};

const FORBIDDEN_ID_CHARS: [char; 6] = ['/', '.', '#', '$', '[', ']'];

/// Identifier of a user record in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let id = raw.trim();
        if id.is_empty() {
            return Err(Error::InvalidInput("User id cannot be empty".to_string()));
        }
        if let Some(ch) = id.chars().find(|ch| FORBIDDEN_ID_CHARS.contains(ch)) {
            return Err(Error::InvalidInput(format!(
                "User id contains forbidden character '{ch}'"
            )));
        }
        Ok(Self(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Normalized attachment fields of a user record.
///
/// Every reference held here has passed the reference validator, and
/// `photos` never exceeds the photo limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttachments {
    pub biodata: Option<String>,
    pub photos: Vec<String>,
}

impl UserAttachments {
    #[must_use]
    pub fn value(&self, class: AttachmentClass) -> AttachmentValue {
        match class {
            AttachmentClass::Biodata => AttachmentValue::Biodata(self.biodata.clone()),
            AttachmentClass::Photos => AttachmentValue::Photos(self.photos.clone()),
        }
    }

    pub fn set(&mut self, value: AttachmentValue) {
        match value {
            AttachmentValue::Biodata(biodata) => self.biodata = biodata,
            AttachmentValue::Photos(photos) => self.photos = photos,
        }
    }

    #[must_use]
    pub fn count(&self, class: AttachmentClass) -> usize {
        match class {
            AttachmentClass::Biodata => usize::from(self.biodata.is_some()),
            AttachmentClass::Photos => self.photos.len(),
        }
    }
}

/// Partial update of a user record, touching only attachment fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    fields: Map<String, Value>,
}

impl RecordPatch {
    /// Build the storage-encoded patch for a single class value.
    #[must_use]
    pub fn for_value(value: &AttachmentValue) -> Self {
        let mut fields = Map::new();
        let encoded = match value {
            AttachmentValue::Biodata(biodata) => encode_biodata(biodata.as_deref()),
            AttachmentValue::Photos(photos) => encode_photos(photos),
        };
        fields.insert(value.class().field_name().to_string(), encoded);
        Self { fields }
    }

    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    #[must_use]
    pub fn into_json(self) -> Value {
        Value::Object(self.fields)
    }
}
