//! Heuristic assignment of table columns to field and signal roles.
//!
//! Column names are classified against an ordered rule table so the tie-break
//! order stays auditable. Explicit naming wins; otherwise the positional
//! convention applies (the field column precedes the signal column in
//! instrument exports). Data is never silently dropped while two or more
//! numeric columns exist.

use super::table::RawTable;
use crate::common::units::FieldUnit;
use crate::domain::{DiagnosticEvent, DiagnosticSink, EsrError, EsrResult};

/// Role a column name can claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Field,
    Signal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameMatch {
    /// Whole cleaned name equals the pattern.
    Exact,
    /// Cleaned name starts with the pattern at a word boundary.
    Prefix,
}

/// One classification rule; rules are evaluated top to bottom, first match
/// wins.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    role: ColumnRole,
    pattern: &'static str,
    kind: NameMatch,
}

const COLUMN_RULES: &[ColumnRule] = &[
    ColumnRule { role: ColumnRole::Field, pattern: "b field", kind: NameMatch::Exact },
    ColumnRule { role: ColumnRole::Field, pattern: "bfield", kind: NameMatch::Exact },
    ColumnRule { role: ColumnRole::Field, pattern: "field", kind: NameMatch::Exact },
    ColumnRule { role: ColumnRole::Field, pattern: "magnetic field", kind: NameMatch::Exact },
    ColumnRule { role: ColumnRole::Field, pattern: "magneticfield", kind: NameMatch::Exact },
    ColumnRule { role: ColumnRole::Field, pattern: "mag field", kind: NameMatch::Exact },
    ColumnRule { role: ColumnRole::Field, pattern: "magfield", kind: NameMatch::Exact },
    ColumnRule { role: ColumnRole::Field, pattern: "b", kind: NameMatch::Exact },
    ColumnRule { role: ColumnRole::Signal, pattern: "signal", kind: NameMatch::Prefix },
    ColumnRule { role: ColumnRole::Signal, pattern: "mw_absorption", kind: NameMatch::Prefix },
    ColumnRule { role: ColumnRole::Signal, pattern: "mw absorption", kind: NameMatch::Prefix },
    ColumnRule { role: ColumnRole::Signal, pattern: "dabs", kind: NameMatch::Prefix },
    ColumnRule { role: ColumnRole::Signal, pattern: "deriv", kind: NameMatch::Prefix },
    ColumnRule { role: ColumnRole::Signal, pattern: "first derivative", kind: NameMatch::Prefix },
    ColumnRule { role: ColumnRole::Signal, pattern: "intensity", kind: NameMatch::Prefix },
    ColumnRule { role: ColumnRole::Signal, pattern: "y", kind: NameMatch::Prefix },
];

/// Successful role assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAxes {
    pub field_column: String,
    pub signal_column: String,
    /// Field unit recorded from an ignored unit-only column.
    pub unit_hint: Option<FieldUnit>,
    /// Set when a positional fallback decided the assignment.
    pub reason: Option<&'static str>,
}

/// Outcome of heuristic resolution. Ambiguity is a value, not an error, so
/// callers can present the candidates and retry with explicit overrides.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisResolution {
    Resolved(ResolvedAxes),
    NeedsSelection { candidates: Vec<String> },
}

/// Classify `name` against the rule table, ignoring a bracketed unit suffix.
pub fn classify_column(name: &str) -> Option<ColumnRole> {
    let cleaned = clean_name(name);
    for rule in COLUMN_RULES {
        let matched = match rule.kind {
            NameMatch::Exact => cleaned == rule.pattern,
            NameMatch::Prefix => {
                cleaned.starts_with(rule.pattern)
                    && cleaned[rule.pattern.len()..]
                        .chars()
                        .next()
                        .is_none_or(|c| !c.is_ascii_alphabetic())
            }
        };
        if matched {
            return Some(rule.role);
        }
    }
    None
}

/// A name that is nothing but a (possibly bracketed) field-unit token.
pub fn unit_only_token(name: &str) -> Option<FieldUnit> {
    let trimmed = name.trim();
    let inner = trimmed
        .strip_prefix(['[', '('])
        .and_then(|r| r.strip_suffix([']', ')']))
        .unwrap_or(trimmed);
    FieldUnit::from_token(inner)
}

/// Strip a bracketed suffix, lowercase and collapse whitespace.
fn clean_name(name: &str) -> String {
    let stem = name
        .find(['[', '('])
        .map_or(name, |at| &name[..at]);
    stem.trim()
        .to_ascii_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Assign the field and signal columns of `table`.
///
/// Resolution ladder, first matching case wins:
/// 1. more than one field-like name among more than two numeric columns is
///    ambiguous and yields [`AxisResolution::NeedsSelection`];
/// 2. one field-like plus at least one signal-like name;
/// 3. one field-like (or one signal-like) name, partner taken positionally;
/// 4. first two numeric columns, oriented so a field-like name ends up on X;
/// 5. a single numeric column degenerately serves as both axes;
/// 6. no numeric column at all is [`EsrError::NoValidColumn`].
pub fn resolve_axes(
    table: &RawTable,
    sink: &mut dyn DiagnosticSink,
) -> EsrResult<AxisResolution> {
    let mut numeric: Vec<&str> = table
        .columns()
        .iter()
        .filter(|c| c.is_numeric())
        .map(|c| c.name.as_str())
        .collect();

    let mut unit_hint = None;
    numeric.retain(|name| match unit_only_token(name) {
        Some(unit) => {
            sink.record(DiagnosticEvent::UnitOnlyColumnIgnored {
                column: name.to_string(),
            });
            if unit_hint.is_none() {
                unit_hint = Some(unit);
            }
            false
        }
        None => true,
    });

    let field_like: Vec<&str> = numeric
        .iter()
        .copied()
        .filter(|n| classify_column(n) == Some(ColumnRole::Field))
        .collect();
    let signal_like: Vec<&str> = numeric
        .iter()
        .copied()
        .filter(|n| classify_column(n) == Some(ColumnRole::Signal))
        .collect();

    if field_like.len() > 1 && numeric.len() > 2 {
        return Ok(AxisResolution::NeedsSelection {
            candidates: numeric.iter().map(|n| n.to_string()).collect(),
        });
    }

    let resolved = if field_like.len() == 1
        && signal_like.iter().any(|&n| n != field_like[0])
    {
        let field = field_like[0];
        let signal = signal_like
            .iter()
            .copied()
            .find(|&n| n != field)
            .unwrap_or(field);
        ResolvedAxes {
            field_column: field.to_string(),
            signal_column: signal.to_string(),
            unit_hint,
            reason: None,
        }
    } else if field_like.len() == 1 && numeric.len() >= 2 {
        let field = field_like[0];
        let signal = numeric.iter().copied().find(|&n| n != field).unwrap_or(field);
        sink.record(DiagnosticEvent::AxisFallback {
            reason: "no signal-like column name; using first other numeric column",
        });
        ResolvedAxes {
            field_column: field.to_string(),
            signal_column: signal.to_string(),
            unit_hint,
            reason: Some("no signal-like column name"),
        }
    } else if signal_like.len() == 1 && numeric.len() >= 2 {
        let signal = signal_like[0];
        let field = numeric.iter().copied().find(|&n| n != signal).unwrap_or(signal);
        sink.record(DiagnosticEvent::AxisFallback {
            reason: "no field-like column name; using first other numeric column",
        });
        ResolvedAxes {
            field_column: field.to_string(),
            signal_column: signal.to_string(),
            unit_hint,
            reason: Some("no field-like column name"),
        }
    } else if numeric.len() >= 2 {
        let mut field = numeric[0];
        let mut signal = numeric[1];
        if classify_column(field) != Some(ColumnRole::Field)
            && classify_column(signal) == Some(ColumnRole::Field)
        {
            std::mem::swap(&mut field, &mut signal);
        }
        sink.record(DiagnosticEvent::AxisFallback {
            reason: "defaulted to first two numeric columns",
        });
        ResolvedAxes {
            field_column: field.to_string(),
            signal_column: signal.to_string(),
            unit_hint,
            reason: Some("defaulted to first two numeric columns"),
        }
    } else if numeric.len() == 1 {
        sink.record(DiagnosticEvent::AxisFallback {
            reason: "only one numeric column",
        });
        ResolvedAxes {
            field_column: numeric[0].to_string(),
            signal_column: numeric[0].to_string(),
            unit_hint,
            reason: Some("only one numeric column"),
        }
    } else {
        return Err(EsrError::NoValidColumn);
    };

    Ok(AxisResolution::Resolved(resolved))
}
