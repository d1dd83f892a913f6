//! matrimony-core - Core library for the profile media pipeline
//!
//! This crate contains the attachment models, validators, record loader,
//! upload lanes, auto-persist writer, and the edit-screen controller used by
//! every operator interface.

pub mod codec;
pub mod config;
pub mod error;
pub mod intake;
pub mod lane;
pub mod loader;
pub mod models;
pub mod persist;
pub mod records;
pub mod reference;
pub mod screen;
pub mod state;
pub mod storage;
pub mod util;

#[cfg(test)]
mod pipeline_tests;

pub use error::{Error, Result};
pub use models::{AttachmentClass, AttachmentValue, CandidateFile, UserAttachments, UserId};
pub use screen::{EditScreen, RemovalOutcome};
