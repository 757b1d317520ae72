use anyhow::{Context, Result};
use finrag_core::chunk::{Chunker, ChunkerConfig};
use finrag_core::config::FinragConfig;
use finrag_core::extract::PdfExtractor;
use serde::Serialize;
use std::fs;
use tabled::Tabled;

use crate::cli::InspectArgs;
use crate::output::OutputWriter;

#[derive(Tabled)]
struct AnalyticsRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Count")]
    count: usize,
}

#[derive(Serialize)]
struct InspectOutput {
    pages: usize,
    text_count: usize,
    table_count: usize,
    figure_count: usize,
    chunk_count: usize,
}

pub fn execute(args: &InspectArgs, output: &OutputWriter, config: &FinragConfig) -> Result<()> {
    let bytes = fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let extraction = PdfExtractor::new().extract(&bytes)?;

    let chunker_config =
        ChunkerConfig::with_window(config.max_chunk_size.value, config.chunk_overlap.value)?;
    let chunks = Chunker::new(chunker_config).chunk(&extraction.units);

    if output.is_json() {
        output.result(&InspectOutput {
            pages: extraction.page_count,
            text_count: extraction.analytics.text,
            table_count: extraction.analytics.table,
            figure_count: extraction.analytics.figure,
            chunk_count: chunks.len(),
        })?;
        return Ok(());
    }

    output.section("Document Structure");
    output.kv("File", args.file.display());
    output.kv("Pages", extraction.page_count);
    output.kv("Chunks", chunks.len());

    output.table(vec![
        AnalyticsRow { kind: "text", count: extraction.analytics.text },
        AnalyticsRow { kind: "table", count: extraction.analytics.table },
        AnalyticsRow { kind: "figure", count: extraction.analytics.figure },
    ]);

    Ok(())
}
