//! Upload lane: validate, upload serially, then persist one batch for one class.
//!
//! ```text
//! Idle -> Validating -> Uploading(i/n) -> Persisting -> Idle
//!              \-> Idle  (rejected, no network activity)
//! ```
//!
//! Files are uploaded one at a time so progress is monotonic and a failure can
//! be pinned on a specific file. A failed file does not stop the batch.

use chrono::Utc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::intake::{check_batch, AcceptedFile, BatchRejection};
use crate::models::{AttachmentClass, AttachmentValue, CandidateFile};
use crate::persist::AutoPersistWriter;
use crate::records::RecordStore;
use crate::state::{LanePhase, StateHandle};
use crate::storage::BlobStore;
use crate::util::sanitize_token;
use crate::Result;

const MAX_EXTENSION_LEN: usize = 8;

/// What happened to a batch handed to a lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Nothing was offered.
    Empty,
    /// The lane or screen was not accepting input; nothing happened.
    Busy,
    /// Rejected before any upload.
    Rejected(BatchRejection),
    /// At least validation ran per file; see the report.
    Completed(BatchReport),
}

/// Result of a batch that got past batch-level validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// References of files that uploaded, in batch order.
    pub uploaded: Vec<String>,
    /// Intake and transport errors, in the order they were found.
    pub errors: Vec<String>,
    /// Whether the new value reached the record store.
    pub persisted: bool,
}

/// One independent pipeline per attachment class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLane {
    class: AttachmentClass,
}

impl UploadLane {
    #[must_use]
    pub const fn new(class: AttachmentClass) -> Self {
        Self { class }
    }

    #[must_use]
    pub const fn class(&self) -> AttachmentClass {
        self.class
    }

    /// Run one batch through validation, serial upload, and persistence.
    pub async fn run<B, R>(
        &self,
        files: Vec<CandidateFile>,
        blobs: &B,
        writer: &AutoPersistWriter<R>,
        state: &StateHandle,
    ) -> BatchOutcome
    where
        B: BlobStore,
        R: RecordStore,
    {
        let class = self.class;
        if files.is_empty() {
            return BatchOutcome::Empty;
        }

        let mut current_count = None;
        state.update(|state| {
            if state.controls_enabled(class) {
                let lane = state.lane_mut(class);
                lane.phase = LanePhase::Validating;
                lane.progress = 0;
                lane.current_file_name.clear();
                current_count = Some(state.attachments.count(class));
            }
        });
        let Some(current_count) = current_count else {
            tracing::debug!(class = %class, "Ignoring batch while lane is busy");
            return BatchOutcome::Busy;
        };

        let intake = match check_batch(class, current_count, files) {
            Ok(intake) => intake,
            Err(rejection) => {
                tracing::info!(class = %class, "Batch rejected: {rejection}");
                let now = Instant::now();
                state.update(|state| {
                    state.push_error(rejection.to_string(), now);
                    state.lane_mut(class).phase = LanePhase::Idle;
                });
                return BatchOutcome::Rejected(rejection);
            }
        };

        let mut report = BatchReport {
            errors: intake.errors,
            ..BatchReport::default()
        };
        let total = intake.accepted.len();
        tracing::info!(
            user_id = %writer.user_id(),
            class = %class,
            total,
            rejected = report.errors.len(),
            "Starting upload batch"
        );

        for (index, accepted) in intake.accepted.iter().enumerate() {
            let now = Instant::now();
            state.update(|state| {
                let lane = state.lane_mut(class);
                lane.phase = LanePhase::Uploading {
                    completed: index,
                    total,
                };
                lane.current_file_name.clone_from(&accepted.file.name);
                state.set_status(
                    format!("Uploading {} ({}/{total})...", accepted.file.name, index + 1),
                    now,
                );
            });

            match upload_one(class, accepted, blobs).await {
                Ok(url) => report.uploaded.push(url),
                Err(error) => {
                    tracing::warn!(
                        class = %class,
                        file = %accepted.file.name,
                        "Upload failed: {error}"
                    );
                    report
                        .errors
                        .push(format!("Failed to upload {}.", accepted.file.name));
                }
            }

            let progress = progress_percent(index + 1, total);
            tracing::debug!(class = %class, progress, "Upload progress");
            state.update(|state| {
                let lane = state.lane_mut(class);
                lane.phase = LanePhase::Uploading {
                    completed: index + 1,
                    total,
                };
                lane.progress = progress;
            });
        }

        if !report.uploaded.is_empty() {
            state.update(|state| {
                state.lane_mut(class).phase = LanePhase::Persisting;
                state.set_status(format!("Saving {class}..."), Instant::now());
            });
            let uploaded = report.uploaded.clone();
            report.persisted = writer
                .apply(state, class, move |current| merge(current, uploaded))
                .await
                .is_ok();
        }

        tracing::info!(
            class = %class,
            uploaded = report.uploaded.len(),
            errors = report.errors.len(),
            persisted = report.persisted,
            "Finished upload batch"
        );

        let now = Instant::now();
        let errors = report.errors.clone();
        state.update(|state| {
            state.push_errors(errors, now);
            state.lane_mut(class).finish(now);
        });

        BatchOutcome::Completed(report)
    }
}

async fn upload_one<B: BlobStore>(
    class: AttachmentClass,
    accepted: &AcceptedFile,
    blobs: &B,
) -> Result<String> {
    let object_key = object_key(class, &accepted.file.name, &accepted.mime_type);
    blobs
        .upload(&object_key, &accepted.file.bytes, &accepted.mime_type)
        .await?;
    blobs.resolve_url(&object_key).await
}

/// New biodata replaces the old one; new photos are appended.
fn merge(current: &AttachmentValue, uploaded: Vec<String>) -> AttachmentValue {
    match current {
        AttachmentValue::Biodata(existing) => {
            AttachmentValue::Biodata(uploaded.last().cloned().or_else(|| existing.clone()))
        }
        AttachmentValue::Photos(existing) => {
            let mut photos = existing.clone();
            photos.extend(uploaded);
            AttachmentValue::Photos(photos)
        }
    }
}

/// `round(completed / total * 100)`, rounding halves up.
fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (completed * 200 + total) / (total * 2);
    u8::try_from(percent.min(100)).unwrap_or(100)
}

/// Collision-resistant object key; the original file name only contributes its extension.
pub fn object_key(class: AttachmentClass, file_name: &str, mime_type: &str) -> String {
    let ts = Utc::now().timestamp_millis();
    let id = Uuid::now_v7().simple().to_string();
    let suffix = &id[id.len() - 12..];
    let ext = extension_for(file_name, mime_type);
    format!("{}/{ts}-{suffix}.{ext}", class.namespace())
}

fn extension_for(file_name: &str, mime_type: &str) -> String {
    file_name
        .trim()
        .rsplit_once('.')
        .map(|(_, ext)| sanitize_token(ext))
        .filter(|ext| !ext.is_empty() && ext.len() <= MAX_EXTENSION_LEN)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(mime_type)
                .and_then(|extensions| extensions.first())
                .map(|ext| (*ext).to_string())
        })
        .unwrap_or_else(|| "img".to_string())
}
