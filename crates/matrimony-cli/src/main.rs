//! Matrimony CLI - operator shell for profile attachments
//!
//! Inspect a user's biodata and photos, upload new images, and remove old
//! ones without opening the admin screen.

mod cli;
mod commands;
mod error;


use clap::Parser;
use matrimony_core::AttachmentClass;

use crate::cli::{AttachTarget, Cli, Commands, RemoveTarget};
use crate::commands::attach::run_attach;
use crate::commands::check_storage::run_check_storage;
use crate::commands::check_url::run_check_url;
use crate::commands::remove::{run_remove_biodata, run_remove_photo};
use crate::commands::show::run_show;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        "matrimony=info"
            .parse()
            .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?,
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show { user, json } => run_show(&user, json).await?,
        Commands::Attach { target } => match target {
            AttachTarget::Biodata { user, file } => {
                run_attach(AttachmentClass::Biodata, &user, &[file]).await?;
            }
            AttachTarget::Photos { user, files } => {
                run_attach(AttachmentClass::Photos, &user, &files).await?;
            }
        },
        Commands::Remove { target } => match target {
            RemoveTarget::Photo { user, index } => run_remove_photo(&user, index).await?,
            RemoveTarget::Biodata { user } => run_remove_biodata(&user).await?,
        },
        Commands::CheckUrl { url } => run_check_url(&url)?,
        Commands::CheckStorage => run_check_storage().await?,
    }

    Ok(())
}
