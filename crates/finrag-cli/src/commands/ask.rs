use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use finrag_core::config::FinragConfig;
use finrag_core::models::AnswerResult;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::cli::AskArgs;
use crate::commands::build_session;
use crate::output::OutputWriter;

#[derive(Serialize)]
struct AskOutput<'a> {
    question: &'a str,
    answer: &'a str,
    grounded: bool,
    sources: Vec<SourceOutput>,
}

#[derive(Serialize)]
struct SourceOutput {
    page: usize,
    kind: String,
    score: f32,
    excerpt: String,
}

pub fn execute(args: &AskArgs, output: &OutputWriter, config: &FinragConfig) -> Result<()> {
    let bytes = fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let session = build_session(config)?;

    let spinner = indexing_spinner(output);
    let receipt = session.upload(&bytes)?;
    spinner.finish_and_clear();

    output.success(format!(
        "Indexed {} pages into {} chunks",
        receipt.page_count, receipt.chunk_count
    ));

    let result = session.ask(&args.question)?;
    print_answer(output, &result)?;

    Ok(())
}

pub(crate) fn indexing_spinner(output: &OutputWriter) -> ProgressBar {
    if output.is_json() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Extracting, chunking, and indexing document...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub(crate) fn print_answer(output: &OutputWriter, result: &AnswerResult) -> Result<()> {
    if output.is_json() {
        return output.result(&AskOutput {
            question: &result.question,
            answer: &result.answer_text,
            grounded: result.grounded,
            sources: result
                .sources
                .iter()
                .map(|s| SourceOutput {
                    page: s.page_number,
                    kind: s.kind.to_string(),
                    score: s.score,
                    excerpt: s.excerpt.clone(),
                })
                .collect(),
        });
    }

    output.section("Answer");
    println!("{}", result.answer_text);

    if !result.grounded {
        output.warning("No passage cleared the relevance floor; try rephrasing the question.");
        return Ok(());
    }

    output.section("Sources");
    for (i, source) in result.sources.iter().enumerate() {
        output.info(format!(
            "{}. p. {} ({}, score {:.2})",
            i + 1,
            source.page_number,
            source.kind,
            source.score
        ));
        output.kv("  excerpt", &source.excerpt);
    }

    Ok(())
}
