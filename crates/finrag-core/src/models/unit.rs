use serde::{Deserialize, Serialize};

/// Kind of a structural content unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Text,
    Table,
    Figure,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitKind::Text => write!(f, "text"),
            UnitKind::Table => write!(f, "table"),
            UnitKind::Figure => write!(f, "figure"),
        }
    }
}

/// A normalized tabular grid extracted from a document page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGrid {
    /// Header cells (first detected row)
    pub header: Vec<String>,

    /// Body rows, each padded to the header width
    pub rows: Vec<Vec<String>>,
}

impl TableGrid {
    /// Build a grid from raw rows, treating the first row as the header.
    ///
    /// Rows are padded or truncated to the header width so the grid stays
    /// rectangular.
    pub fn from_rows(mut raw: Vec<Vec<String>>) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        let header = raw.remove(0);
        let width = header.len();
        let rows = raw
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Some(Self { header, rows })
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Total rows including the header
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }

    /// Render the grid as plain text, one row per line with `|` separators.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.header.join(" | "));
        for row in &self.rows {
            lines.push(row.join(" | "));
        }
        lines.join("\n")
    }

    /// Render the header plus a slice of body rows, for row-group chunking.
    pub fn rows_to_text(&self, range: std::ops::Range<usize>) -> String {
        let mut lines = Vec::with_capacity(range.len() + 1);
        lines.push(self.header.join(" | "));
        for row in &self.rows[range] {
            lines.push(row.join(" | "));
        }
        lines.join("\n")
    }
}

/// Content carried by a unit, tagged by structural kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UnitBody {
    Text { content: String },
    Table { grid: TableGrid },
    Figure { caption: Option<String> },
}

/// One structurally distinct element extracted from a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUnit {
    /// 1-based page the unit was extracted from
    pub page_number: usize,

    /// Document-order position, strictly increasing across all kinds
    pub order_index: usize,

    /// Typed content
    pub body: UnitBody,
}

impl ContentUnit {
    pub fn kind(&self) -> UnitKind {
        match self.body {
            UnitBody::Text { .. } => UnitKind::Text,
            UnitBody::Table { .. } => UnitKind::Table,
            UnitBody::Figure { .. } => UnitKind::Figure,
        }
    }

    /// Raw textual rendering of the unit.
    ///
    /// Tables render cell-wise; caption-less figures render as an empty
    /// placeholder so analytics counts stay meaningful without OCR.
    pub fn raw_text(&self) -> String {
        match &self.body {
            UnitBody::Text { content } => content.clone(),
            UnitBody::Table { grid } => grid.to_text(),
            UnitBody::Figure { caption } => caption.clone().unwrap_or_default(),
        }
    }
}

/// Per-kind unit counts for the active document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCounts {
    pub text: usize,
    pub table: usize,
    pub figure: usize,
}

impl UnitCounts {
    pub fn tally(units: &[ContentUnit]) -> Self {
        let mut counts = Self::default();
        for unit in units {
            match unit.kind() {
                UnitKind::Text => counts.text += 1,
                UnitKind::Table => counts.table += 1,
                UnitKind::Figure => counts.figure += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.text + self.table + self.figure
    }
}

/// Result of extracting a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// All content units in document order
    pub units: Vec<ContentUnit>,

    /// Number of pages in the document
    pub page_count: usize,

    /// Per-kind unit counts
    pub analytics: UnitCounts,
}
