//! SI normalization of the resolved field and signal columns.

use super::axes::ResolvedAxes;
use super::table::RawTable;
use crate::common::units::FieldUnit;
use crate::domain::{DiagnosticEvent, DiagnosticSink, EsrError, EsrResult, UnitSource};

/// Field axis in tesla plus the untouched signal, with the unit decision that
/// produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAxes {
    pub field_tesla: Vec<f64>,
    pub signal: Vec<f64>,
    pub unit: FieldUnit,
    pub unit_source: UnitSource,
}

/// Convert the resolved columns into SI arrays.
///
/// The field unit comes from a token embedded in the column name, else from
/// the resolver's unit-only-column hint, else tesla is assumed. The signal is
/// never unit-converted. Rows where either value is non-finite are dropped.
pub fn normalize_axes(
    table: &RawTable,
    axes: &ResolvedAxes,
    sink: &mut dyn DiagnosticSink,
) -> EsrResult<NormalizedAxes> {
    let field_column = table.column(&axes.field_column).ok_or_else(|| {
        EsrError::invalid_parameter(format!("no column named '{}'", axes.field_column))
    })?;
    let signal_column = table.column(&axes.signal_column).ok_or_else(|| {
        EsrError::invalid_parameter(format!("no column named '{}'", axes.signal_column))
    })?;

    let (unit, unit_source) = match embedded_unit(&axes.field_column) {
        Some(unit) => (unit, UnitSource::Header),
        None => match axes.unit_hint {
            Some(unit) => (unit, UnitSource::Hint),
            None => (FieldUnit::Tesla, UnitSource::Assumed),
        },
    };
    sink.record(DiagnosticEvent::UnitResolved {
        unit,
        source: unit_source,
    });

    let factor = unit.to_tesla_factor();
    let mut field_tesla = Vec::with_capacity(field_column.values.len());
    let mut signal = Vec::with_capacity(signal_column.values.len());
    let mut dropped = 0usize;
    for (&b, &s) in field_column.values.iter().zip(signal_column.values.iter()) {
        if b.is_finite() && s.is_finite() {
            field_tesla.push(b * factor);
            signal.push(s);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        sink.record(DiagnosticEvent::RowsDropped {
            stage: "normalize",
            count: dropped,
        });
    }

    Ok(NormalizedAxes {
        field_tesla,
        signal,
        unit,
        unit_source,
    })
}

/// Word-boundary search for a field-unit token inside a column name.
/// `mT` is tried before `G` before `T` so the longer token wins.
fn embedded_unit(name: &str) -> Option<FieldUnit> {
    for token in ["mT", "G", "T"] {
        if contains_word(name, token) {
            return FieldUnit::from_token(token);
        }
    }
    None
}

fn contains_word(haystack: &str, word: &str) -> bool {
    let lower = haystack.to_ascii_lowercase();
    let needle = word.to_ascii_lowercase();
    let mut from = 0;
    while let Some(at) = lower[from..].find(&needle) {
        let start = from + at;
        let end = start + needle.len();
        let before_ok = lower[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_ascii_alphanumeric() && c != '_');
        let after_ok = lower[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_alphanumeric() && c != '_');
        if before_ok && after_ok {
            return true;
        }
        from = end;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{embedded_unit, normalize_axes};
    use crate::common::units::FieldUnit;
    use crate::domain::{CollectingSink, DiagnosticEvent, EsrError, NullSink, UnitSource};
    use crate::ingest::axes::ResolvedAxes;
    use crate::ingest::table::{RawColumn, RawTable};

    fn two_columns(field_name: &str, field: &[f64], signal: &[f64]) -> RawTable {
        RawTable::from_columns(vec![
            RawColumn {
                name: field_name.to_string(),
                values: field.to_vec(),
            },
            RawColumn {
                name: "Signal".to_string(),
                values: signal.to_vec(),
            },
        ])
    }

    fn axes_for(field_name: &str, unit_hint: Option<FieldUnit>) -> ResolvedAxes {
        ResolvedAxes {
            field_column: field_name.to_string(),
            signal_column: "Signal".to_string(),
            unit_hint,
            reason: None,
        }
    }

    #[test]
    fn bracketed_millitesla_header_scales_to_tesla() {
        let table = two_columns("Field (mT)", &[100.0, 200.0], &[1.0, 2.0]);
        let axes = axes_for("Field (mT)", None);
        let normalized = normalize_axes(&table, &axes, &mut NullSink).expect("normalize");
        assert_eq!(normalized.field_tesla, [0.1, 0.2]);
        assert_eq!(normalized.signal, [1.0, 2.0]);
        assert_eq!(normalized.unit, FieldUnit::Millitesla);
        assert_eq!(normalized.unit_source, UnitSource::Header);
    }

    #[test]
    fn unit_tokens_require_word_boundaries() {
        assert_eq!(embedded_unit("Field [mT]"), Some(FieldUnit::Millitesla));
        assert_eq!(embedded_unit("Field(G)"), Some(FieldUnit::Gauss));
        assert_eq!(embedded_unit("Field / T"), Some(FieldUnit::Tesla));
        // "mT" inside a longer word does not count.
        assert_eq!(embedded_unit("segment"), None);
        assert_eq!(embedded_unit("Feld"), None);
    }

    #[test]
    fn resolver_hint_applies_when_the_header_has_no_token() {
        let table = two_columns("Field", &[3480.0, 3481.0], &[1.0, 2.0]);
        let axes = axes_for("Field", Some(FieldUnit::Gauss));
        let normalized = normalize_axes(&table, &axes, &mut NullSink).expect("normalize");
        assert!((normalized.field_tesla[0] - 0.348).abs() <= 1.0e-12);
        assert_eq!(normalized.unit_source, UnitSource::Hint);
    }

    #[test]
    fn tesla_is_assumed_without_token_or_hint() {
        let table = two_columns("Field", &[0.348, 0.349], &[1.0, 2.0]);
        let axes = axes_for("Field", None);
        let mut sink = CollectingSink::new();
        let normalized = normalize_axes(&table, &axes, &mut sink).expect("normalize");
        assert_eq!(normalized.unit, FieldUnit::Tesla);
        assert_eq!(normalized.unit_source, UnitSource::Assumed);
        assert!(sink.events().contains(&DiagnosticEvent::UnitResolved {
            unit: FieldUnit::Tesla,
            source: UnitSource::Assumed,
        }));
    }

    #[test]
    fn non_finite_rows_are_dropped_pairwise() {
        let table = two_columns(
            "Field [T]",
            &[0.1, f64::NAN, 0.3, 0.4],
            &[1.0, 2.0, f64::NAN, 4.0],
        );
        let axes = axes_for("Field [T]", None);
        let mut sink = CollectingSink::new();
        let normalized = normalize_axes(&table, &axes, &mut sink).expect("normalize");
        assert_eq!(normalized.field_tesla, [0.1, 0.4]);
        assert_eq!(normalized.signal, [1.0, 4.0]);
        assert!(sink.events().contains(&DiagnosticEvent::RowsDropped {
            stage: "normalize",
            count: 2,
        }));
    }

    #[test]
    fn unknown_column_names_are_invalid_parameters() {
        let table = two_columns("Field", &[0.1], &[1.0]);
        let axes = axes_for("Bogus", None);
        assert!(matches!(
            normalize_axes(&table, &axes, &mut NullSink),
            Err(EsrError::InvalidParameter(_))
        ));
    }
}
