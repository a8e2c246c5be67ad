//! Free-text header parsing into typed experiment parameters.
//!
//! Each field has an independent, case-insensitive keyword rule tolerant of a
//! numeric value with an optional unit token. Lines matching no rule are
//! skipped; later matches overwrite earlier ones. Unknown unit tokens fall
//! back to the base unit with a recorded warning, never a silent wrong
//! conversion.

use crate::common::units::celsius_to_kelvin;
use crate::domain::{DiagnosticEvent, DiagnosticSink};
use crate::spectrum::EsrMeta;

/// Parse the lines preceding the header row into an [`EsrMeta`].
pub fn extract_metadata(lines: &[String], sink: &mut dyn DiagnosticSink) -> EsrMeta {
    let mut meta = EsrMeta::default();

    for raw in lines {
        let line = raw.trim().trim_start_matches('#').trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_ascii_lowercase();

        if let Some((value, unit)) = value_after_keyword(line, &lower, "frequency", false) {
            meta.frequency_hz = Some(match unit.to_ascii_lowercase().as_str() {
                "ghz" => value * 1.0e9,
                "mhz" => value * 1.0e6,
                "hz" | "" => value,
                _ => {
                    warn_unknown(sink, "frequency", &unit);
                    value
                }
            });
        }
        if let Some((value, unit)) = value_after_keyword(line, &lower, "modulat", false) {
            meta.mod_amp_t = Some(match unit.to_ascii_lowercase().as_str() {
                "mt" => value * 1.0e-3,
                "g" => value * 1.0e-4,
                "t" | "" => value,
                _ => {
                    warn_unknown(sink, "modulation amplitude", &unit);
                    value
                }
            });
        }
        if (lower.contains("microwave") || lower.contains("mw"))
            && let Some((value, unit)) = value_after_keyword(line, &lower, "power", false)
        {
            meta.mw_power_w = Some(match unit.to_ascii_lowercase().as_str() {
                "mw" => value * 1.0e-3,
                "w" | "" => value,
                _ => {
                    warn_unknown(sink, "microwave power", &unit);
                    value
                }
            });
        }
        if let Some((value, unit)) = value_after_keyword(line, &lower, "temp", false) {
            let unit_lower = unit.to_ascii_lowercase();
            meta.temperature_k = Some(if unit_lower.starts_with('c') || unit.contains('°') {
                celsius_to_kelvin(value)
            } else if unit_lower == "k" || unit_lower.is_empty() {
                value
            } else {
                warn_unknown(sink, "temperature", &unit);
                value
            });
        }
        if let Some((value, unit)) = value_after_keyword(line, &lower, "phase", true) {
            let unit_lower = unit.to_ascii_lowercase();
            meta.phase_rad = Some(if unit_lower.starts_with("deg") {
                value.to_radians()
            } else if unit_lower == "rad" || unit_lower.is_empty() {
                value
            } else {
                warn_unknown(sink, "phase", &unit);
                value
            });
        }
        if let Some(text) = text_after_keyword(line, &lower, "instrument") {
            meta.instrument = Some(text);
        }
        if let Some(text) = text_after_keyword(line, &lower, "operator") {
            meta.operator = Some(text);
        }
        if let Some(text) = text_after_keyword(line, &lower, "date") {
            meta.timestamp = Some(text);
        }
    }

    meta
}

fn warn_unknown(sink: &mut dyn DiagnosticSink, field: &'static str, token: &str) {
    sink.record(DiagnosticEvent::UnknownUnitToken {
        field,
        token: token.to_string(),
    });
}

/// Find `keyword` in the lowercased line and parse the first number after it,
/// returning the value and the (possibly empty) trailing unit token.
fn value_after_keyword(
    line: &str,
    lower: &str,
    keyword: &str,
    signed: bool,
) -> Option<(f64, String)> {
    let at = lower.find(keyword)?;
    let rest = &line[at + keyword.len()..];
    let (value, after) = scan_number(rest, signed)?;
    Some((value, scan_unit_token(after)))
}

/// Free-text field: everything after `keyword` plus a separator.
fn text_after_keyword(line: &str, lower: &str, keyword: &str) -> Option<String> {
    let at = lower.find(keyword)?;
    let rest = line[at + keyword.len()..].trim_start_matches([':', '=', ' ', '\t']);
    let trimmed = rest.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse the first number in `rest`, tolerating decimal commas. Returns the
/// value and the remainder of the line after it.
fn scan_number(rest: &str, signed: bool) -> Option<(f64, &str)> {
    let chars: Vec<(usize, char)> = rest.char_indices().collect();
    let mut start = None;
    for (position, &(index, c)) in chars.iter().enumerate() {
        if c.is_ascii_digit() {
            start = Some(index);
            if signed && position > 0 {
                let (prev_index, prev) = chars[position - 1];
                if prev == '-' || prev == '+' {
                    start = Some(prev_index);
                }
            }
            break;
        }
    }
    let start = start?;

    let tail = &rest[start..];
    let mut end = tail.len();
    for (index, c) in tail.char_indices() {
        let numeric = c.is_ascii_digit() || c == '.' || c == ',' || c == '-' || c == '+';
        if index == 0 || numeric {
            continue;
        }
        end = index;
        break;
    }
    let mut token = &tail[..end];
    // A comma or dot glued to the unit is a separator, not a decimal mark.
    token = token.trim_end_matches(['.', ',']);
    let value: f64 = token.replace(',', ".").parse().ok()?;
    Some((value, &tail[end..]))
}

/// Alphabetic (plus degree-sign) run following the number.
fn scan_unit_token(after: &str) -> String {
    after
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphabetic() || *c == '°')
        .collect()
}
