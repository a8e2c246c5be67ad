//! Delimiter sniffing and header-row detection over raw text lines.

use crate::domain::{DiagnosticEvent, DiagnosticSink};

/// Delimiters considered by the sniffer, in preference order.
pub const DELIMITER_CANDIDATES: [char; 4] = [',', ';', '\t', ' '];

/// Number of content lines sampled when sniffing the delimiter.
pub const SNIFF_SAMPLE_LINES: usize = 10;

/// Fraction of tokens on a line that must parse as numbers for the line to
/// count as the start of the data block.
pub const NUMERIC_LINE_FRACTION: f64 = 0.8;

/// Outcome of the layout scan: where the table starts and how it is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedLayout {
    /// `None` when sniffing failed; splitting falls back to any run of
    /// whitespace, commas or semicolons.
    pub delimiter: Option<char>,
    /// Line index treated as the column-name row. The data block starts on
    /// the next line.
    pub header_index: usize,
}

/// Sniff the delimiter and locate the header row.
///
/// The delimiter is the first candidate appearing the same nonzero number of
/// times (outside quotes) on every sampled content line. The header row is
/// the line immediately preceding the first mostly-numeric line, floored at
/// zero; a file with no clear numeric line keeps `header_index = 0`.
pub fn detect_layout(lines: &[String], sink: &mut dyn DiagnosticSink) -> DetectedLayout {
    let delimiter = sniff_delimiter(lines);
    sink.record(DiagnosticEvent::DelimiterDetected { delimiter });

    let mut header_index = 0;
    for (index, line) in lines.iter().enumerate() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        let tokens = split_line(stripped, delimiter);
        if is_mostly_numeric(&tokens) {
            header_index = index.saturating_sub(1);
            break;
        }
    }
    sink.record(DiagnosticEvent::HeaderRowDetected {
        index: header_index,
    });

    DetectedLayout {
        delimiter,
        header_index,
    }
}

/// Split one line into cell tokens.
///
/// With a known delimiter the split is quote-aware and strips the surrounding
/// quotes from each cell; without one, any run of whitespace, commas or
/// semicolons separates tokens.
pub fn split_line(line: &str, delimiter: Option<char>) -> Vec<String> {
    match delimiter {
        Some(d) => split_delimited(line, d),
        None => split_loose(line),
    }
}

/// Split on any run of whitespace, commas or semicolons.
pub fn split_loose(line: &str) -> Vec<String> {
    line.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_delimited(line: &str, delimiter: char) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == delimiter && !in_quotes {
            tokens.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    tokens.push(current);
    tokens
}

/// Parse a cell into a number.
///
/// Tolerates surrounding quotes, decimal commas and a trailing unit token
/// separated by whitespace (`"100 mT"` parses as 100).
pub fn parse_number(token: &str) -> Option<f64> {
    let cleaned = token.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = cleaned.replace(',', ".");
    if let Ok(value) = normalized.parse::<f64>() {
        return Some(value);
    }
    let first = normalized.split_whitespace().next()?;
    first.parse().ok()
}

/// True when at least [`NUMERIC_LINE_FRACTION`] of the non-empty tokens parse
/// as numbers.
pub fn is_mostly_numeric(tokens: &[String]) -> bool {
    let mut numeric = 0usize;
    let mut total = 0usize;
    for token in tokens {
        if token.trim().is_empty() {
            continue;
        }
        total += 1;
        if parse_number(token).is_some() {
            numeric += 1;
        }
    }
    total > 0 && numeric as f64 / total as f64 >= NUMERIC_LINE_FRACTION
}

fn sniff_delimiter(lines: &[String]) -> Option<char> {
    let sample: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .take(SNIFF_SAMPLE_LINES)
        .collect();
    if sample.is_empty() {
        return None;
    }

    for candidate in DELIMITER_CANDIDATES {
        let mut counts = sample.iter().map(|line| unquoted_count(line, candidate));
        let first = match counts.next() {
            Some(count) if count > 0 => count,
            _ => continue,
        };
        if counts.all(|count| count == first) {
            return Some(candidate);
        }
    }
    None
}

fn unquoted_count(line: &str, delimiter: char) -> usize {
    let mut count = 0;
    let mut in_quotes = false;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}
