//! Data models for the attachment pipeline

mod attachment;
mod user;

pub use attachment::{AttachmentClass, AttachmentValue, CandidateFile};
pub use user::{RecordPatch, UserAttachments, UserId};
