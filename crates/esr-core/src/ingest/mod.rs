//! Heuristic file ingestion: text layout detection through spectrum
//! construction.
//!
//! The stages run in a fixed order — layout detection, metadata extraction,
//! table building, axis resolution, unit normalization — and every heuristic
//! decision is reported to the caller-supplied [`DiagnosticSink`]. Ambiguous
//! axis resolution is returned as a value so callers can present the
//! candidate columns and retry with explicit overrides.

pub mod axes;
pub mod detect;
pub mod metadata;
pub mod normalize;
pub mod table;

pub use axes::{AxisResolution, ColumnRole, ResolvedAxes, classify_column, resolve_axes};
pub use detect::{DetectedLayout, detect_layout};
pub use metadata::extract_metadata;
pub use normalize::{NormalizedAxes, normalize_axes};
pub use table::{RawColumn, RawTable, build_table};

use crate::domain::{DiagnosticSink, EsrError, EsrResult};
use crate::spectrum::EsrSpectrum;
use std::fs;
use std::path::Path;

/// Minimum surviving rows for a load to produce a spectrum.
pub const MIN_VALID_ROWS: usize = 10;

/// Explicit column assignment supplied after an ambiguous resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisOverride {
    pub field: String,
    pub signal: String,
}

/// Result of a load: either a spectrum or a request for manual column
/// selection.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Spectrum(EsrSpectrum),
    AxisSelectionNeeded { candidates: Vec<String> },
}

/// Load a spectrum from `path`, dispatching on the file extension.
///
/// `.csv`, `.tsv` and `.txt` are structurally identical since the delimiter
/// is detected from content; anything else is [`EsrError::UnsupportedFileType`].
pub fn load_any(path: &Path, sink: &mut dyn DiagnosticSink) -> EsrResult<LoadOutcome> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "csv" | "tsv" | "txt" => load(path, None, sink),
        _ => Err(EsrError::UnsupportedFileType { extension }),
    }
}

/// Run the full ingestion pipeline on `path`.
///
/// With `overrides` the axis-resolution heuristics are skipped entirely and
/// the named columns are used as-is.
pub fn load(
    path: &Path,
    overrides: Option<&AxisOverride>,
    sink: &mut dyn DiagnosticSink,
) -> EsrResult<LoadOutcome> {
    let text = fs::read_to_string(path).map_err(|e| EsrError::io(path, &e))?;
    let lines: Vec<String> = text.lines().map(str::to_string).collect();

    let layout = detect_layout(&lines, sink);
    let meta = extract_metadata(&lines[..layout.header_index], sink);
    let table = build_table(&lines, &layout, sink);

    let resolved = match overrides {
        Some(choice) => ResolvedAxes {
            field_column: choice.field.clone(),
            signal_column: choice.signal.clone(),
            unit_hint: None,
            reason: None,
        },
        None => match resolve_axes(&table, sink)? {
            AxisResolution::Resolved(resolved) => resolved,
            AxisResolution::NeedsSelection { candidates } => {
                return Ok(LoadOutcome::AxisSelectionNeeded { candidates });
            }
        },
    };

    // A degenerate single-column resolution cannot make a spectrum.
    if resolved.field_column == resolved.signal_column {
        return Err(EsrError::NoValidColumn);
    }

    let normalized = normalize_axes(&table, &resolved, sink)?;
    if normalized.field_tesla.len() < MIN_VALID_ROWS {
        return Err(EsrError::InsufficientData {
            rows: normalized.field_tesla.len(),
            minimum: MIN_VALID_ROWS,
        });
    }

    let spectrum = EsrSpectrum::new(normalized.field_tesla, normalized.signal, meta)?;
    Ok(LoadOutcome::Spectrum(spectrum))
}
