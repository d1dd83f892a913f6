use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "matrimony")]
#[command(about = "Manage biodata and photo attachments on matrimony profiles")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a user's attachments after validation
    Show {
        /// User record ID
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload images and attach them to a user
    Attach {
        #[command(subcommand)]
        target: AttachTarget,
    },
    /// Remove an attachment from a user
    #[command(alias = "rm")]
    Remove {
        #[command(subcommand)]
        target: RemoveTarget,
    },
    /// Check whether a URL points into the configured bucket
    CheckUrl {
        /// URL to check
        url: String,
    },
    /// Check that the configured bucket is reachable with current credentials
    CheckStorage,
}

#[derive(Subcommand)]
pub enum AttachTarget {
    /// Replace the biodata image
    #[command(alias = "bio")]
    Biodata {
        /// User record ID
        user: String,
        /// Image file to upload
        file: PathBuf,
    },
    /// Add gallery photos
    #[command(alias = "photo")]
    Photos {
        /// User record ID
        user: String,
        /// Image files to upload, in gallery order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum RemoveTarget {
    /// Remove one gallery photo by position
    #[command(alias = "photos")]
    Photo {
        /// User record ID
        user: String,
        /// Position as listed by `matrimony show`, starting at 0
        index: usize,
    },
    /// Clear the biodata image
    #[command(alias = "bio")]
    Biodata {
        /// User record ID
        user: String,
    },
}
