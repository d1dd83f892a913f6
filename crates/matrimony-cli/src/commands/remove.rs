use matrimony_core::{AttachmentClass, RemovalOutcome};

use crate::commands::common::{open_screen, print_messages};
use crate::error::CliError;

pub async fn run_remove_photo(user: &str, index: usize) -> Result<(), CliError> {
    let screen = open_screen(user).await?;
    let outcome = screen.remove_photo(index).await;
    print_messages(&screen.snapshot());
    check_removal(outcome, AttachmentClass::Photos, &format!("photo at position {index}"))
}

pub async fn run_remove_biodata(user: &str) -> Result<(), CliError> {
    let screen = open_screen(user).await?;
    let outcome = screen.remove_biodata().await;
    print_messages(&screen.snapshot());
    check_removal(outcome, AttachmentClass::Biodata, "biodata image")
}

pub fn check_removal(
    outcome: RemovalOutcome,
    class: AttachmentClass,
    target: &str,
) -> Result<(), CliError> {
    match outcome {
        RemovalOutcome::Removed => Ok(()),
        RemovalOutcome::Busy => Err(CliError::Busy(class)),
        RemovalOutcome::Missing => Err(CliError::NothingToRemove(target.to_string())),
        RemovalOutcome::Failed => Err(CliError::SaveFailed(class)),
    }
}
