//! Page text segmentation: separating table-shaped line runs from
//! free-flowing text and harvesting figure caption candidates.

use crate::models::TableGrid;

/// One structural segment of a page's text
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Text(String),
    Table(TableGrid),
}

/// Minimum consecutive table-shaped lines to form a table
const MIN_TABLE_ROWS: usize = 2;

/// Split a line into cells on tabs or runs of two-plus spaces.
pub(crate) fn split_cells(line: &str) -> Vec<String> {
    line.replace('\t', "  ")
        .split("  ")
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_table_line(line: &str) -> bool {
    split_cells(line).len() >= 2
}

fn is_caption_line(line: &str) -> bool {
    let first = line.trim().split_whitespace().next().unwrap_or("");
    let first = first.trim_end_matches(|c: char| !c.is_alphanumeric());
    matches!(first.to_ascii_lowercase().as_str(), "figure" | "chart" | "exhibit")
}

/// Segment one page of extracted text into text blocks and tables, and
/// collect caption candidate lines in page order.
///
/// Caption lines stay part of the surrounding flow; they are only copied
/// out so figures can reference them.
pub(crate) fn segment_page(text: &str) -> (Vec<Segment>, Vec<String>) {
    let mut segments = Vec::new();
    let mut captions = Vec::new();
    let mut block_lines: Vec<&str> = Vec::new();
    let mut table_rows: Vec<Vec<String>> = Vec::new();

    fn flush_block(block_lines: &mut Vec<&str>, segments: &mut Vec<Segment>) {
        if !block_lines.is_empty() {
            segments.push(Segment::Text(block_lines.join("\n")));
            block_lines.clear();
        }
    }

    fn flush_table<'a>(
        table_rows: &mut Vec<Vec<String>>,
        block_lines: &mut Vec<&'a str>,
        pending_lines: &mut Vec<&'a str>,
        segments: &mut Vec<Segment>,
    ) {
        if table_rows.len() >= MIN_TABLE_ROWS {
            flush_block(block_lines, segments);
            if let Some(grid) = TableGrid::from_rows(std::mem::take(table_rows)) {
                segments.push(Segment::Table(grid));
            }
        } else {
            // Lone table-shaped line amid prose stays prose
            block_lines.append(pending_lines);
            table_rows.clear();
        }
        pending_lines.clear();
    }

    // Original lines of the current table run, kept so a short run can be
    // demoted back into the text block verbatim.
    let mut pending_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush_table(&mut table_rows, &mut block_lines, &mut pending_lines, &mut segments);
            flush_block(&mut block_lines, &mut segments);
            continue;
        }

        if is_caption_line(trimmed) {
            captions.push(trimmed.to_string());
        }

        if is_table_line(trimmed) {
            table_rows.push(split_cells(trimmed));
            pending_lines.push(trimmed);
        } else {
            flush_table(&mut table_rows, &mut block_lines, &mut pending_lines, &mut segments);
            block_lines.push(trimmed);
        }
    }

    flush_table(&mut table_rows, &mut block_lines, &mut pending_lines, &mut segments);
    flush_block(&mut block_lines, &mut segments);

    (segments, captions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_cells_on_multiple_spaces() {
        assert_eq!(split_cells("Year  Revenue"), vec!["Year", "Revenue"]);
        assert_eq!(split_cells("2023    4.2M   12%"), vec!["2023", "4.2M", "12%"]);
        assert_eq!(split_cells("net income  4.2"), vec!["net income", "4.2"]);
    }

    #[test]
    fn test_split_cells_on_tabs() {
        assert_eq!(split_cells("2023\t4.2M"), vec!["2023", "4.2M"]);
    }

    #[test]
    fn test_split_cells_single_cell() {
        assert_eq!(split_cells("A plain sentence with single spaces."), vec![
            "A plain sentence with single spaces."
        ]);
    }

    #[test]
    fn test_segment_text_only() {
        let (segments, captions) = segment_page("First paragraph line one.\nline two.\n\nSecond paragraph.");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], Segment::Text("First paragraph line one.\nline two.".to_string()));
        assert_eq!(segments[1], Segment::Text("Second paragraph.".to_string()));
        assert!(captions.is_empty());
    }

    #[test]
    fn test_segment_detects_table_run() {
        let text = "Results by year were as follows.\nYear  Revenue\n2022  3.1M\n2023  4.2M\nGrowth continued.";
        let (segments, _) = segment_page(text);

        assert_eq!(segments.len(), 3);
        assert!(matches!(segments[0], Segment::Text(_)));
        let Segment::Table(ref grid) = segments[1] else {
            panic!("expected table segment, got {:?}", segments[1]);
        };
        assert_eq!(grid.header, vec!["Year", "Revenue"]);
        assert_eq!(grid.rows, vec![
            vec!["2022".to_string(), "3.1M".to_string()],
            vec!["2023".to_string(), "4.2M".to_string()],
        ]);
        assert!(matches!(segments[2], Segment::Text(_)));
    }

    #[test]
    fn test_lone_table_line_stays_prose() {
        let text = "Intro.\nTotal  4.2M\nOutro.";
        let (segments, _) = segment_page(text);

        assert_eq!(segments.len(), 1);
        assert_eq!(
            segments[0],
            Segment::Text("Intro.\nTotal  4.2M\nOutro.".to_string())
        );
    }

    #[test]
    fn test_caption_lines_collected_and_kept_in_flow() {
        let text = "Figure 3: Revenue by region\nSome commentary.";
        let (segments, captions) = segment_page(text);

        assert_eq!(captions, vec!["Figure 3: Revenue by region".to_string()]);
        assert_eq!(segments.len(), 1);
        let Segment::Text(ref block) = segments[0] else {
            panic!("expected text segment");
        };
        assert!(block.contains("Figure 3"));
    }

    #[test]
    fn test_caption_keywords_case_insensitive() {
        let (_, captions) = segment_page("EXHIBIT 10.1: Credit agreement\nchart 2 shows margins");
        assert_eq!(captions.len(), 2);
    }

    #[test]
    fn test_empty_page_yields_nothing() {
        let (segments, captions) = segment_page("   \n\n  \n");
        assert!(segments.is_empty());
        assert!(captions.is_empty());
    }
}
