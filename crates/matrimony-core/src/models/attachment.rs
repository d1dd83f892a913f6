//! Attachment classes and candidate files

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// One of the two managed attachment fields on a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentClass {
    /// Single biodata image.
    Biodata,
    /// Up to ten profile photos.
    Photos,
}

impl AttachmentClass {
    /// Every class, in display order.
    pub const ALL: [Self; 2] = [Self::Biodata, Self::Photos];

    /// Field name on the remote user record.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Biodata => "biodata",
            Self::Photos => "photos",
        }
    }

    /// Object-store namespace that uploads for this class land under.
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::Biodata => "matrimony/bio",
            Self::Photos => "matrimony/photos",
        }
    }

    /// Capitalized label for operator messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Biodata => "Biodata",
            Self::Photos => "Photos",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Biodata => 0,
            Self::Photos => 1,
        }
    }
}

impl fmt::Display for AttachmentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for AttachmentClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "biodata" | "bio" => Ok(Self::Biodata),
            "photos" | "photo" => Ok(Self::Photos),
            other => Err(Error::InvalidInput(format!(
                "Unknown attachment class: {other}"
            ))),
        }
    }
}

/// The in-memory value held for one attachment class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", content = "value", rename_all = "lowercase")]
pub enum AttachmentValue {
    Biodata(Option<String>),
    Photos(Vec<String>),
}

impl AttachmentValue {
    /// Class this value belongs to.
    #[must_use]
    pub const fn class(&self) -> AttachmentClass {
        match self {
            Self::Biodata(_) => AttachmentClass::Biodata,
            Self::Photos(_) => AttachmentClass::Photos,
        }
    }

    /// Number of references held.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Biodata(value) => usize::from(value.is_some()),
            Self::Photos(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A file offered by the operator through drag-and-drop or the file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Original file name as reported by the picker.
    pub name: String,
    /// Declared content type, when the picker supplied one.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.map(ToOwned::to_owned),
            bytes,
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::try_from(self.bytes.len()).unwrap_or(u64::MAX)
    }
}
