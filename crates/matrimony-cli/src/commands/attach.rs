use std::path::PathBuf;

use matrimony_core::lane::BatchOutcome;
use matrimony_core::state::AttachmentState;
use matrimony_core::AttachmentClass;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::commands::common::{format_progress_line, open_screen, print_messages, read_candidate};
use crate::error::CliError;

pub async fn run_attach(
    class: AttachmentClass,
    user: &str,
    paths: &[PathBuf],
) -> Result<(), CliError> {
    let screen = open_screen(user).await?;

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(read_candidate(path).await?);
    }

    let printer = spawn_progress_printer(screen.subscribe(), class);
    let outcome = screen.pick_files(class, files).await;
    printer.abort();

    print_messages(&screen.snapshot());

    match outcome {
        BatchOutcome::Empty => Ok(()),
        BatchOutcome::Busy => Err(CliError::Busy(class)),
        BatchOutcome::Rejected(rejection) => Err(CliError::Rejected(rejection.to_string())),
        BatchOutcome::Completed(report) => {
            for url in &report.uploaded {
                println!("{url}");
            }
            if report.persisted {
                Ok(())
            } else {
                Err(CliError::NothingPersisted(class))
            }
        }
    }
}

fn spawn_progress_printer(
    mut changes: watch::Receiver<AttachmentState>,
    class: AttachmentClass,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_line = None;
        while changes.changed().await.is_ok() {
            let line = format_progress_line(class, changes.borrow_and_update().lane(class));
            if line.is_some() && line != last_line {
                if let Some(text) = &line {
                    eprintln!("{text}");
                }
                last_line = line;
            }
        }
    })
}
