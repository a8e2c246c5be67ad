//! Rectangular numeric table construction from detected data lines.

use super::detect::{DetectedLayout, parse_number, split_line, split_loose};
use crate::domain::{DiagnosticEvent, DiagnosticSink};

/// Fraction of finite values a column needs to count as numeric.
pub const NUMERIC_COLUMN_FRACTION: f64 = 0.9;

/// One named column; failed coercions are carried as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub values: Vec<f64>,
}

impl RawColumn {
    pub fn finite_fraction(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let finite = self.values.iter().filter(|v| v.is_finite()).count();
        finite as f64 / self.values.len() as f64
    }

    pub fn is_numeric(&self) -> bool {
        self.finite_fraction() >= NUMERIC_COLUMN_FRACTION
    }
}

/// Ordered numeric columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<RawColumn>,
}

impl RawTable {
    /// Build directly from prepared columns.
    pub fn from_columns(columns: Vec<RawColumn>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[RawColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Build the numeric table from the lines below the header row.
///
/// A single-column result (sniffing failed or the file packs all values into
/// one quoted cell) is re-split on whitespace/comma/semicolon runs, with the
/// column names re-derived from the header line. Empty-named columns are
/// dropped, and rows that are non-numeric in every column are dropped.
pub fn build_table(
    lines: &[String],
    layout: &DetectedLayout,
    sink: &mut dyn DiagnosticSink,
) -> RawTable {
    let header_line = lines
        .get(layout.header_index)
        .map(|l| l.trim())
        .unwrap_or_default();
    let mut names = header_tokens(header_line, layout.delimiter);

    let data_lines: Vec<&str> = lines
        .iter()
        .skip(layout.header_index + 1)
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut rows: Vec<Vec<String>> = data_lines
        .iter()
        .map(|line| split_line(line, layout.delimiter.or(Some(','))))
        .collect();

    // Packed single column: every row and the header collapse to one cell.
    if names.len() <= 1 && rows.iter().all(|r| r.len() <= 1) && !rows.is_empty() {
        rows = data_lines.iter().map(|line| split_loose(line)).collect();
        names = packed_header_tokens(header_line);
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        sink.record(DiagnosticEvent::PackedColumnSplit { columns: width });
    }

    let width = names.len();
    let mut columns: Vec<RawColumn> = names
        .into_iter()
        .map(|name| RawColumn {
            name,
            values: Vec::with_capacity(rows.len()),
        })
        .collect();

    let mut dropped = 0usize;
    for row in &rows {
        let parsed: Vec<f64> = (0..width)
            .map(|i| {
                row.get(i)
                    .and_then(|cell| parse_number(cell))
                    .unwrap_or(f64::NAN)
            })
            .collect();
        if parsed.iter().all(|v| v.is_nan()) {
            dropped += 1;
            continue;
        }
        for (column, value) in columns.iter_mut().zip(parsed) {
            column.values.push(value);
        }
    }
    if dropped > 0 {
        sink.record(DiagnosticEvent::RowsDropped {
            stage: "table",
            count: dropped,
        });
    }

    columns.retain(|c| !c.name.is_empty());
    RawTable { columns }
}

fn header_tokens(header_line: &str, delimiter: Option<char>) -> Vec<String> {
    split_line(header_line, delimiter.or(Some(',')))
        .into_iter()
        .map(|t| t.trim().trim_matches('"').trim().to_string())
        .collect()
}

/// Header names for the packed case: whitespace/comma/semicolon tokens, or a
/// plain comma split when the header itself is one packed cell.
fn packed_header_tokens(header_line: &str) -> Vec<String> {
    let stripped = header_line.trim().trim_matches('"');
    let tokens = split_loose(stripped);
    let tokens = if tokens.len() == 1 && tokens[0].contains(',') {
        tokens[0].split(',').map(str::to_string).collect()
    } else if tokens.len() <= 1 && stripped.contains(',') {
        stripped.split(',').map(str::to_string).collect()
    } else {
        tokens
    };
    tokens
        .into_iter()
        .map(|t| t.trim().trim_matches('"').trim().to_string())
        .collect()
}
