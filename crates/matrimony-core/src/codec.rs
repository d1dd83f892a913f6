//! Storage encoding of the attachment fields.
//!
//! `photos` has historically been written both as a JSON list and as a single
//! comma-joined string. Reads accept either; writes always produce the joined
//! string so older readers keep working. This module is the only place that
//! knows about either shape.

use serde_json::Value;

use crate::reference::ReferenceValidator;

/// Separator used by the joined-string photo encoding.
pub const PHOTO_DELIMITER: &str = ",";

/// Result of decoding a stored `photos` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedPhotos {
    /// Valid references in stored order.
    pub photos: Vec<String>,
    /// Entries that were present but rejected.
    pub dropped: usize,
}

/// Decode a stored `biodata` field, dropping anything that is not a valid reference.
pub fn decode_biodata(raw: &Value, validator: &ReferenceValidator) -> Option<String> {
    raw.as_str()
        .filter(|value| validator.is_valid(value))
        .map(ToOwned::to_owned)
}

/// Decode a stored `photos` field in either list or joined-string form.
pub fn decode_photos(raw: &Value, validator: &ReferenceValidator) -> DecodedPhotos {
    let from_string = matches!(raw, Value::String(_));
    let entries: Vec<Option<&str>> = match raw {
        Value::Null => Vec::new(),
        Value::String(joined) => joined
            .split(PHOTO_DELIMITER)
            .map(|part| Some(part.trim()))
            .collect(),
        Value::Array(items) => items.iter().map(Value::as_str).collect(),
        _ => vec![None],
    };

    let mut decoded = DecodedPhotos::default();
    for entry in entries {
        match entry {
            Some("") if from_string => {}
            Some(value) if validator.is_valid(value) => decoded.photos.push(value.to_string()),
            _ => decoded.dropped += 1,
        }
    }
    decoded
}

/// Encode a `biodata` value for storage.
pub fn encode_biodata(biodata: Option<&str>) -> Value {
    biodata.map_or(Value::Null, |value| Value::String(value.to_string()))
}

/// Encode a photo list into the joined-string storage form.
pub fn encode_photos<S: AsRef<str>>(photos: &[S]) -> Value {
    let joined = photos
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(PHOTO_DELIMITER);
    Value::String(joined)
}
