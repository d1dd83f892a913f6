use crate::commands::common::{format_attachment_lines, open_screen, summarize};
use crate::error::CliError;

pub async fn run_show(user: &str, as_json: bool) -> Result<(), CliError> {
    let screen = open_screen(user).await?;
    let state = screen.snapshot();

    if as_json {
        let summary = summarize(screen.user_id(), &state);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in format_attachment_lines(&state) {
            println!("{line}");
        }
    }

    Ok(())
}
