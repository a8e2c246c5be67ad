pub mod errors;

pub use errors::{EsrError, EsrResult};

use crate::common::units::FieldUnit;
use std::fmt::{Display, Formatter};

/// Where the field unit used for normalization came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSource {
    /// Bracketed token found in the resolved column name.
    Header,
    /// Unit-only column recorded by the axis resolver.
    Hint,
    /// No token anywhere; tesla assumed.
    Assumed,
}

impl UnitSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Hint => "hint",
            Self::Assumed => "assumed",
        }
    }
}

/// One observable decision made by the ingestion heuristics.
///
/// Events are pushed into a caller-supplied [`DiagnosticSink`] so dropped rows,
/// fallback reasons and unit decisions are capturable per call instead of only
/// through process-wide logging.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    DelimiterDetected { delimiter: Option<char> },
    HeaderRowDetected { index: usize },
    PackedColumnSplit { columns: usize },
    UnitOnlyColumnIgnored { column: String },
    AxisFallback { reason: &'static str },
    UnitResolved { unit: FieldUnit, source: UnitSource },
    UnknownUnitToken { field: &'static str, token: String },
    RowsDropped { stage: &'static str, count: usize },
}

impl Display for DiagnosticEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DelimiterDetected { delimiter: Some(d) } => {
                write!(f, "detected delimiter {d:?}")
            }
            Self::DelimiterDetected { delimiter: None } => {
                f.write_str("no delimiter detected; splitting on whitespace/comma/semicolon")
            }
            Self::HeaderRowDetected { index } => write!(f, "header row at line {index}"),
            Self::PackedColumnSplit { columns } => {
                write!(f, "packed single column re-split into {columns} columns")
            }
            Self::UnitOnlyColumnIgnored { column } => {
                write!(f, "ignored unit-only column '{column}'")
            }
            Self::AxisFallback { reason } => write!(f, "axis fallback: {reason}"),
            Self::UnitResolved { unit, source } => {
                write!(f, "field unit {} from {}", unit.as_str(), source.as_str())
            }
            Self::UnknownUnitToken { field, token } => {
                write!(f, "unknown unit token '{token}' for {field}; using base unit")
            }
            Self::RowsDropped { stage, count } => {
                write!(f, "dropped {count} rows during {stage}")
            }
        }
    }
}

/// Per-call diagnostics receiver for the ingestion layer.
pub trait DiagnosticSink {
    fn record(&mut self, event: DiagnosticEvent);
}

/// Discards every event. Useful when only the spectrum matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&mut self, _event: DiagnosticEvent) {}
}

/// Accumulates events in order for later inspection.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    events: Vec<DiagnosticEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[DiagnosticEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<DiagnosticEvent> {
        self.events
    }
}

impl DiagnosticSink for CollectingSink {
    fn record(&mut self, event: DiagnosticEvent) {
        tracing::debug!(event = %event, "ingest");
        self.events.push(event);
    }
}
