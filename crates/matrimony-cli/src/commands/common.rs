use std::path::Path;

use matrimony_core::config::PipelineConfig;
use matrimony_core::records::RestRecordStore;
use matrimony_core::reference::ReferenceValidator;
use matrimony_core::state::{AttachmentState, LanePhase, LaneStatus, LoadStatus};
use matrimony_core::storage::{R2Config, R2Storage};
use matrimony_core::{AttachmentClass, CandidateFile, EditScreen, Error, UserId};
use serde::Serialize;

use crate::error::CliError;

pub type Screen = EditScreen<R2Storage, RestRecordStore>;

#[derive(Debug, Serialize)]
pub struct AttachmentSummary {
    pub user_id: String,
    pub biodata: Option<String>,
    pub photos: Vec<String>,
}

/// Mount the edit screen for `user` against the configured backends.
pub async fn open_screen(user: &str) -> Result<Screen, CliError> {
    let user_id = UserId::new(user)?;
    let config = PipelineConfig::from_env()?;
    let validator = ReferenceValidator::for_r2(&config.storage)?;
    let blobs = R2Storage::new(config.storage);
    let records = RestRecordStore::new(config.records)?;

    let screen = match EditScreen::mount(user_id, blobs, records, validator).await {
        Ok(screen) => screen,
        Err(Error::NotFound(id)) => return Err(CliError::UserNotFound(id)),
        Err(error) => return Err(error.into()),
    };

    if screen.snapshot().load == LoadStatus::Failed {
        return Err(CliError::LoadFailed(user.to_string()));
    }
    Ok(screen)
}

/// Object storage settings from the environment; required.
pub fn storage_config() -> Result<R2Config, CliError> {
    R2Config::from_env()?.ok_or_else(|| {
        CliError::Config(
            "Object storage is not configured. Set R2_ACCOUNT_ID, R2_BUCKET, R2_ACCESS_KEY_ID and R2_SECRET_ACCESS_KEY."
                .to_string(),
        )
    })
}

/// Read a local file into an upload candidate.
pub async fn read_candidate(path: &Path) -> Result<CandidateFile, CliError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CliError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    let content_type = mime_guess::from_path(path).first_raw();
    Ok(CandidateFile::new(name, content_type, bytes))
}

pub fn summarize(user_id: &UserId, state: &AttachmentState) -> AttachmentSummary {
    AttachmentSummary {
        user_id: user_id.to_string(),
        biodata: state.biodata_image().map(ToString::to_string),
        photos: state.user_images().to_vec(),
    }
}

pub fn format_attachment_lines(state: &AttachmentState) -> Vec<String> {
    let mut lines = vec![format!(
        "biodata  {}",
        state.biodata_image().unwrap_or("(none)")
    )];

    let photos = state.user_images();
    if photos.is_empty() {
        lines.push("photos   (none)".to_string());
    } else {
        lines.push(format!("photos   {}/10", photos.len()));
        lines.extend(
            photos
                .iter()
                .enumerate()
                .map(|(index, url)| format!("  [{index}] {url}")),
        );
    }
    lines
}

/// One progress line for a lane, or `None` when there is nothing to show.
pub fn format_progress_line(class: AttachmentClass, lane: &LaneStatus) -> Option<String> {
    match lane.phase {
        LanePhase::Uploading { completed, total } => Some(format!(
            "{class}: {:>3}%  {} ({completed}/{total})",
            lane.progress, lane.current_file_name
        )),
        LanePhase::Persisting => Some(format!("{class}: saving...")),
        LanePhase::Idle | LanePhase::Validating => None,
    }
}

/// Print the messages still on display in the final snapshot.
pub fn print_messages(state: &AttachmentState) {
    for error in state.errors() {
        eprintln!("{error}");
    }
    if let Some(status) = state.status_message() {
        eprintln!("{status}");
    }
}
