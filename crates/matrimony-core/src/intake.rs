//! Pre-upload checks on a batch of candidate files.
//!
//! Batch-level limits reject the whole batch before any file is looked at.
//! Per-file checks only exclude the offending file; its siblings still upload.

use thiserror::Error;

use crate::models::{AttachmentClass, CandidateFile};

/// Largest accepted file, in bytes.
pub const MAX_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;

/// Most photos a profile may hold.
pub const MAX_PHOTOS: usize = 10;

/// Batch-level rejection; nothing in the batch is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchRejection {
    #[error("Please select only one biodata image.")]
    MultipleBiodata,
    #[error("You can upload a maximum of 10 photos. You currently have {current} photos.")]
    PhotoLimit { current: usize },
}

/// Files that passed intake, plus per-file errors for the ones that did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeReport {
    pub accepted: Vec<AcceptedFile>,
    pub errors: Vec<String>,
}

/// A candidate file with its resolved MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFile {
    pub file: CandidateFile,
    pub mime_type: String,
}

/// Validate a batch for `class` against the number of references it already holds.
pub fn check_batch(
    class: AttachmentClass,
    current_count: usize,
    files: Vec<CandidateFile>,
) -> Result<IntakeReport, BatchRejection> {
    match class {
        AttachmentClass::Biodata if files.len() > 1 => {
            return Err(BatchRejection::MultipleBiodata);
        }
        AttachmentClass::Photos if current_count + files.len() > MAX_PHOTOS => {
            return Err(BatchRejection::PhotoLimit {
                current: current_count,
            });
        }
        _ => {}
    }

    let mut report = IntakeReport::default();
    for file in files {
        let mime_type = infer_mime_type(file.content_type.as_deref(), &file.name);
        if !is_image_mime_type(&mime_type) {
            report.errors.push(format!("{} is not an image file.", file.name));
            continue;
        }
        if file.size() > MAX_FILE_SIZE_BYTES {
            report.errors.push(format!("{} is larger than 5MB.", file.name));
            continue;
        }
        report.accepted.push(AcceptedFile { file, mime_type });
    }
    Ok(report)
}

/// Resolve a MIME type from the declared content type and the file name.
///
/// A declared type wins unless it is blank or `application/octet-stream`;
/// only then does the file extension decide.
pub fn infer_mime_type(content_type: Option<&str>, file_name: &str) -> String {
    let declared = content_type
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty() && value != "application/octet-stream");
    if let Some(declared) = declared {
        return declared;
    }

    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

pub fn is_image_mime_type(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}
