//! Chunking of content units into bounded, overlapping text windows.
//!
//! Chunking is a pure function of the input units and configuration.
//! Adjacent text units form runs that are sliced into character windows
//! with a fixed overlap; tables and figure captions chunk separately so a
//! table row never straddles a window boundary.

use crate::error::{FinragError, Result};
use crate::models::{Chunk, ChunkId, ContentUnit, TableGrid, UnitBody, UnitKind};

/// How tables are turned into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePolicy {
    /// One chunk per table up to the size ceiling, else greedy row groups
    WholeTable,
    /// Fixed-size row groups with the header repeated in each group
    RowGroups { rows_per_group: usize },
}

/// Configuration for chunk generation
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Maximum chunk size in characters
    pub max_chunk_size: usize,
    /// Characters repeated between consecutive chunks of a run
    pub overlap: usize,
    /// How far behind the hard limit a sentence boundary is preferred
    pub boundary_tolerance: usize,
    /// Table chunking policy
    pub table_policy: TablePolicy,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1200,
            overlap: 120,
            boundary_tolerance: 200,
            table_policy: TablePolicy::WholeTable,
        }
    }
}

impl ChunkerConfig {
    /// Create a new configuration, validating the window invariants.
    pub fn new(
        max_chunk_size: usize,
        overlap: usize,
        boundary_tolerance: usize,
        table_policy: TablePolicy,
    ) -> Result<Self> {
        if max_chunk_size == 0 {
            return Err(FinragError::ConfigInvalid {
                key: "max_chunk_size".to_string(),
                reason: "max_chunk_size must be at least 1".to_string(),
            });
        }

        if overlap >= max_chunk_size {
            return Err(FinragError::ConfigInvalid {
                key: "chunk_overlap".to_string(),
                reason: format!(
                    "overlap ({}) must be less than max_chunk_size ({})",
                    overlap, max_chunk_size
                ),
            });
        }

        // Every break must land past the overlap carried into the next
        // chunk, or slicing would stop advancing.
        if overlap + boundary_tolerance >= max_chunk_size {
            return Err(FinragError::ConfigInvalid {
                key: "boundary_tolerance".to_string(),
                reason: format!(
                    "overlap ({}) plus boundary_tolerance ({}) must be less than max_chunk_size ({})",
                    overlap, boundary_tolerance, max_chunk_size
                ),
            });
        }

        if let TablePolicy::RowGroups { rows_per_group } = table_policy {
            if rows_per_group == 0 {
                return Err(FinragError::ConfigInvalid {
                    key: "rows_per_group".to_string(),
                    reason: "rows_per_group must be at least 1".to_string(),
                });
            }
        }

        Ok(Self { max_chunk_size, overlap, boundary_tolerance, table_policy })
    }

    /// Build a config from window sizes alone, deriving a boundary
    /// tolerance that keeps slicing well-formed.
    pub fn with_window(max_chunk_size: usize, overlap: usize) -> Result<Self> {
        let tolerance = Self::default()
            .boundary_tolerance
            .min(max_chunk_size.saturating_sub(overlap + 1));
        Self::new(max_chunk_size, overlap, tolerance, TablePolicy::WholeTable)
    }
}

/// Collapse all whitespace runs to single spaces and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Char span of one unit inside a concatenated text run
struct UnitSpan {
    start: usize,
    end: usize,
    order_index: usize,
    page_number: usize,
}

/// Splits content units into chunks
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk units in document order.
    ///
    /// Caption-less figures produce no chunk; they carry no embeddable
    /// text but still count in extraction analytics.
    pub fn chunk(&self, units: &[ContentUnit]) -> Vec<Chunk> {
        let mut out = Vec::new();
        let mut run: Vec<&ContentUnit> = Vec::new();

        for unit in units {
            match &unit.body {
                UnitBody::Text { .. } => run.push(unit),
                UnitBody::Table { grid } => {
                    self.flush_run(&mut run, &mut out);
                    self.chunk_table(grid, unit, &mut out);
                }
                UnitBody::Figure { caption } => {
                    self.flush_run(&mut run, &mut out);
                    if let Some(caption) = caption {
                        let text = normalize_whitespace(caption);
                        if !text.is_empty() {
                            push_chunk(
                                &mut out,
                                text,
                                vec![unit.order_index],
                                unit.page_number,
                                UnitKind::Figure,
                                unit.order_index,
                                0,
                            );
                        }
                    }
                }
            }
        }
        self.flush_run(&mut run, &mut out);

        out
    }

    /// Concatenate a run of adjacent text units and slice it into windows.
    fn flush_run(&self, run: &mut Vec<&ContentUnit>, out: &mut Vec<Chunk>) {
        if run.is_empty() {
            return;
        }

        let mut chars: Vec<char> = Vec::new();
        let mut spans: Vec<UnitSpan> = Vec::new();

        for unit in run.iter() {
            let UnitBody::Text { content } = &unit.body else {
                continue;
            };
            let normalized = normalize_whitespace(content);
            if normalized.is_empty() {
                continue;
            }
            if !chars.is_empty() {
                chars.push(' ');
            }
            let start = chars.len();
            chars.extend(normalized.chars());
            spans.push(UnitSpan {
                start,
                end: chars.len(),
                order_index: unit.order_index,
                page_number: unit.page_number,
            });
        }
        run.clear();

        if chars.is_empty() {
            return;
        }
        self.slice_run(&chars, &spans, out);
    }

    fn slice_run(&self, chars: &[char], spans: &[UnitSpan], out: &mut Vec<Chunk>) {
        let max = self.config.max_chunk_size;
        let overlap = self.config.overlap;
        let mut start = 0usize;
        let mut first = true;

        loop {
            let prefix = if first { 0 } else { overlap };
            if chars.len() - start <= max {
                self.emit(chars, spans, start, chars.len(), prefix, out);
                return;
            }

            let break_at = self.preferred_break(chars, start, start + max);
            self.emit(chars, spans, start, break_at, prefix, out);
            start = break_at - overlap;
            first = false;
        }
    }

    /// Find a sentence boundary within the tolerance window behind the
    /// hard limit, else break at the hard limit.
    fn preferred_break(&self, chars: &[char], start: usize, hard: usize) -> usize {
        let floor = hard
            .saturating_sub(self.config.boundary_tolerance)
            .max(start + self.config.overlap + 1);

        let mut pos = hard;
        while pos > floor {
            let terminator = matches!(chars[pos - 1], '.' | '!' | '?');
            let followed_by_space = chars.get(pos).map_or(true, |c| *c == ' ');
            if terminator && followed_by_space {
                return pos;
            }
            pos -= 1;
        }
        hard
    }

    fn emit(
        &self,
        chars: &[char],
        spans: &[UnitSpan],
        start: usize,
        end: usize,
        overlap_prefix: usize,
        out: &mut Vec<Chunk>,
    ) {
        let text: String = chars[start..end].iter().collect();
        let contributing: Vec<&UnitSpan> =
            spans.iter().filter(|s| s.start < end && s.end > start).collect();
        let Some(lead) = contributing.first() else {
            return;
        };

        let source_units = contributing.iter().map(|s| s.order_index).collect();
        push_chunk(
            out,
            text,
            source_units,
            lead.page_number,
            UnitKind::Text,
            lead.order_index,
            overlap_prefix,
        );
    }

    fn chunk_table(&self, grid: &TableGrid, unit: &ContentUnit, out: &mut Vec<Chunk>) {
        match self.config.table_policy {
            TablePolicy::WholeTable => {
                let text = normalize_whitespace(&grid.to_text());
                if text.is_empty() {
                    return;
                }
                if text.chars().count() <= self.config.max_chunk_size {
                    self.push_table_chunk(text, unit, out);
                } else {
                    self.chunk_table_greedy(grid, unit, out);
                }
            }
            TablePolicy::RowGroups { rows_per_group } => {
                if grid.rows.is_empty() {
                    let text = normalize_whitespace(&grid.to_text());
                    if !text.is_empty() {
                        self.push_table_chunk(text, unit, out);
                    }
                    return;
                }
                let mut start = 0;
                while start < grid.rows.len() {
                    let end = (start + rows_per_group).min(grid.rows.len());
                    let text = normalize_whitespace(&grid.rows_to_text(start..end));
                    self.push_table_chunk(text, unit, out);
                    start = end;
                }
            }
        }
    }

    /// Greedy row grouping for tables larger than the size ceiling: grow
    /// each group while its header-prefixed rendering fits, at least one
    /// row per group.
    fn chunk_table_greedy(&self, grid: &TableGrid, unit: &ContentUnit, out: &mut Vec<Chunk>) {
        let max = self.config.max_chunk_size;
        let mut start = 0;
        while start < grid.rows.len() {
            let mut end = start + 1;
            while end < grid.rows.len()
                && normalize_whitespace(&grid.rows_to_text(start..end + 1)).chars().count() <= max
            {
                end += 1;
            }
            let text = normalize_whitespace(&grid.rows_to_text(start..end));
            self.push_table_chunk(text, unit, out);
            start = end;
        }
    }

    fn push_table_chunk(&self, text: String, unit: &ContentUnit, out: &mut Vec<Chunk>) {
        push_chunk(
            out,
            text,
            vec![unit.order_index],
            unit.page_number,
            UnitKind::Table,
            unit.order_index,
            0,
        );
    }
}

fn push_chunk(
    out: &mut Vec<Chunk>,
    text: String,
    source_units: Vec<usize>,
    page_number: usize,
    kind: UnitKind,
    order_index: usize,
    overlap_prefix: usize,
) {
    let token_estimate = Chunk::estimate_tokens(&text);
    out.push(Chunk {
        id: ChunkId(out.len() as u64),
        text,
        source_units,
        token_estimate,
        page_number,
        kind,
        order_index,
        overlap_prefix,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_unit(order_index: usize, page: usize, content: &str) -> ContentUnit {
        ContentUnit {
            page_number: page,
            order_index,
            body: UnitBody::Text { content: content.to_string() },
        }
    }

    fn table_unit(order_index: usize, page: usize, rows: Vec<Vec<&str>>) -> ContentUnit {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(str::to_string).collect())
            .collect();
        ContentUnit {
            page_number: page,
            order_index,
            body: UnitBody::Table { grid: TableGrid::from_rows(rows).unwrap() },
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(ChunkerConfig::new(100, 10, 20, TablePolicy::WholeTable).is_ok());
        assert!(ChunkerConfig::new(0, 0, 0, TablePolicy::WholeTable).is_err());
        assert!(ChunkerConfig::new(100, 100, 0, TablePolicy::WholeTable).is_err());
        assert!(ChunkerConfig::new(100, 50, 50, TablePolicy::WholeTable).is_err());
        assert!(ChunkerConfig::new(100, 10, 20, TablePolicy::RowGroups { rows_per_group: 0 })
            .is_err());
    }

    #[test]
    fn test_with_window_derives_valid_tolerance() {
        let config = ChunkerConfig::with_window(1200, 120).unwrap();
        assert_eq!(config.boundary_tolerance, 200);

        // Tight windows shrink the tolerance instead of failing
        let config = ChunkerConfig::with_window(50, 10).unwrap();
        assert!(config.overlap + config.boundary_tolerance < config.max_chunk_size);

        assert!(ChunkerConfig::with_window(50, 50).is_err());
    }

    #[test]
    fn test_short_run_single_chunk() {
        let chunker = Chunker::new(ChunkerConfig::default());
        let units = vec![text_unit(0, 1, "Revenue grew strongly in the period.")];
        let chunks = chunker.chunk(&units);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, ChunkId(0));
        assert_eq!(chunks[0].text, "Revenue grew strongly in the period.");
        assert_eq!(chunks[0].source_units, vec![0]);
        assert_eq!(chunks[0].overlap_prefix, 0);
        assert_eq!(chunks[0].kind, UnitKind::Text);
    }

    #[test]
    fn test_window_sizes_and_overlap() {
        let config = ChunkerConfig::new(50, 10, 0, TablePolicy::WholeTable).unwrap();
        let chunker = Chunker::new(config);
        let long = "word ".repeat(40);
        let units = vec![text_unit(0, 1, &long)];
        let chunks = chunker.chunk(&units);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 50);
        }
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let next: Vec<char> = pair[1].text.chars().collect();
            assert_eq!(pair[1].overlap_prefix, 10);
            // The carried prefix is the previous chunk's tail, verbatim
            assert_eq!(prev[prev.len() - 10..], next[..10]);
        }
    }

    #[test]
    fn test_prefers_sentence_boundary() {
        let config = ChunkerConfig::new(60, 5, 30, TablePolicy::WholeTable).unwrap();
        let chunker = Chunker::new(config);
        let text = "The company performed well in fiscal twenty. Management expects further growth next year.";
        let chunks = chunker.chunk(&[text_unit(0, 1, text)]);

        assert!(chunks.len() >= 2);
        assert!(chunks[0].text.ends_with('.'), "broke mid-sentence: {:?}", chunks[0].text);
    }

    #[test]
    fn test_adjacent_text_units_share_a_run() {
        let config = ChunkerConfig::new(200, 20, 0, TablePolicy::WholeTable).unwrap();
        let chunker = Chunker::new(config);
        let units = vec![
            text_unit(0, 1, "First block."),
            text_unit(1, 1, "Second block."),
        ];
        let chunks = chunker.chunk(&units);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "First block. Second block.");
        assert_eq!(chunks[0].source_units, vec![0, 1]);
    }

    #[test]
    fn test_table_whole_chunk() {
        let chunker = Chunker::new(ChunkerConfig::default());
        let units = vec![table_unit(0, 2, vec![
            vec!["Year", "Revenue"],
            vec!["2023", "4.2M"],
        ])];
        let chunks = chunker.chunk(&units);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Year | Revenue 2023 | 4.2M");
        assert_eq!(chunks[0].kind, UnitKind::Table);
        assert_eq!(chunks[0].page_number, 2);
    }

    #[test]
    fn test_table_row_groups_repeat_header() {
        let config =
            ChunkerConfig::new(1200, 120, 200, TablePolicy::RowGroups { rows_per_group: 2 })
                .unwrap();
        let chunker = Chunker::new(config);
        let units = vec![table_unit(0, 1, vec![
            vec!["Year", "Revenue"],
            vec!["2021", "2.0M"],
            vec!["2022", "3.1M"],
            vec!["2023", "4.2M"],
        ])];
        let chunks = chunker.chunk(&units);

        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert!(chunk.text.starts_with("Year | Revenue"));
        }
        assert!(chunks[1].text.contains("2023"));
    }

    #[test]
    fn test_oversized_table_falls_back_to_row_groups() {
        let config = ChunkerConfig::new(60, 5, 0, TablePolicy::WholeTable).unwrap();
        let chunker = Chunker::new(config);
        let rows: Vec<Vec<&str>> = std::iter::once(vec!["Quarter", "Revenue"])
            .chain((0..12).map(|_| vec!["Q1 2023", "1,042,000"]))
            .collect();
        let chunks = chunker.chunk(&[table_unit(0, 1, rows)]);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.starts_with("Quarter | Revenue"));
        }
    }

    #[test]
    fn test_figure_caption_becomes_chunk() {
        let chunker = Chunker::new(ChunkerConfig::default());
        let units = vec![
            ContentUnit {
                page_number: 3,
                order_index: 0,
                body: UnitBody::Figure { caption: Some("Figure 1: Margin trend".to_string()) },
            },
            ContentUnit {
                page_number: 3,
                order_index: 1,
                body: UnitBody::Figure { caption: None },
            },
        ];
        let chunks = chunker.chunk(&units);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Figure 1: Margin trend");
        assert_eq!(chunks[0].kind, UnitKind::Figure);
    }

    #[test]
    fn test_table_interrupts_text_run() {
        let config = ChunkerConfig::new(500, 20, 0, TablePolicy::WholeTable).unwrap();
        let chunker = Chunker::new(config);
        let units = vec![
            text_unit(0, 1, "Before the table."),
            table_unit(1, 1, vec![vec!["A", "B"], vec!["1", "2"]]),
            text_unit(2, 1, "After the table."),
        ];
        let chunks = chunker.chunk(&units);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "Before the table.");
        assert_eq!(chunks[1].kind, UnitKind::Table);
        assert_eq!(chunks[2].text, "After the table.");
        // Sequential ids across the whole document
        assert_eq!(chunks.iter().map(|c| c.id.0).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let chunker = Chunker::new(ChunkerConfig::default());
        let units = vec![
            text_unit(0, 1, &"The fiscal year closed well. ".repeat(80)),
            table_unit(1, 2, vec![vec!["Year", "Revenue"], vec!["2023", "4.2M"]]),
        ];

        let first = chunker.chunk(&units);
        let second = chunker.chunk(&units);
        assert_eq!(first, second);
    }

    #[test]
    fn test_whitespace_normalization() {
        assert_eq!(normalize_whitespace("  a\n\nb\t c  "), "a b c");
        assert_eq!(normalize_whitespace("\n \t"), "");
    }
}
