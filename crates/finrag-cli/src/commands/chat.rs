use std::fs;

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Input};
use finrag_core::config::FinragConfig;
use finrag_core::error::FinragError;

use crate::cli::ChatArgs;
use crate::commands::ask::{indexing_spinner, print_answer};
use crate::commands::build_session;
use crate::output::OutputWriter;

pub fn execute(args: &ChatArgs, output: &OutputWriter, config: &FinragConfig) -> Result<()> {
    let bytes = fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let session = build_session(config)?;

    let spinner = indexing_spinner(output);
    let receipt = session.upload(&bytes)?;
    spinner.finish_and_clear();

    output.success(format!(
        "Indexed {} pages into {} chunks. Type a question, or 'exit' to quit.",
        receipt.page_count, receipt.chunk_count
    ));

    loop {
        let question: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("question")
            .allow_empty(true)
            .interact_text()?;

        let trimmed = question.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }

        match session.ask(trimmed) {
            Ok(result) => print_answer(output, &result)?,
            // Generation hiccups should not end the conversation
            Err(err @ FinragError::GenerationFailed { .. }) => {
                output.warning(format!("{}", err));
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
