//! Record loader: fetch a user record and normalize its attachment fields.

use serde_json::Value;

use crate::codec::{decode_biodata, decode_photos};
use crate::intake::MAX_PHOTOS;
use crate::models::{AttachmentClass, UserAttachments, UserId};
use crate::records::RecordStore;
use crate::reference::ReferenceValidator;
use crate::{Error, Result};

/// Fetch and normalize the attachments of `user_id`.
///
/// A missing record is [`Error::NotFound`]. Malformed attachment data is
/// never an error; it is dropped here and left untouched in the store.
pub async fn load_attachments<R: RecordStore>(
    store: &R,
    user_id: &UserId,
    validator: &ReferenceValidator,
) -> Result<UserAttachments> {
    let record = store
        .fetch(user_id)
        .await?
        .ok_or_else(|| Error::NotFound(user_id.to_string()))?;
    Ok(normalize_record(user_id, &record, validator))
}

/// Normalize a raw record into validated attachment fields.
pub fn normalize_record(
    user_id: &UserId,
    record: &Value,
    validator: &ReferenceValidator,
) -> UserAttachments {
    let raw_biodata = field(record, AttachmentClass::Biodata);
    let biodata = decode_biodata(raw_biodata, validator);
    if biodata.is_none() && !is_blank(raw_biodata) {
        tracing::warn!(user_id = %user_id, "Dropping invalid biodata reference");
    }

    let decoded = decode_photos(field(record, AttachmentClass::Photos), validator);
    if decoded.dropped > 0 {
        tracing::warn!(
            user_id = %user_id,
            dropped = decoded.dropped,
            "Dropping invalid photo references"
        );
    }

    let mut photos = decoded.photos;
    if photos.len() > MAX_PHOTOS {
        tracing::warn!(
            user_id = %user_id,
            stored = photos.len(),
            "Record holds more photos than allowed, keeping the first {MAX_PHOTOS}"
        );
        photos.truncate(MAX_PHOTOS);
    }

    UserAttachments { biodata, photos }
}

static NULL: Value = Value::Null;

fn field(record: &Value, class: AttachmentClass) -> &Value {
    record.get(class.field_name()).unwrap_or(&NULL)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}
