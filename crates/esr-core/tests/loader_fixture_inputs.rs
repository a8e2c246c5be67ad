use esr_core::domain::{CollectingSink, DiagnosticEvent, EsrError, NullSink, UnitSource};
use esr_core::ingest::{AxisOverride, load, load_any};
use esr_core::{EsrSpectrum, FieldUnit, LoadOutcome};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

fn expect_spectrum(outcome: LoadOutcome) -> EsrSpectrum {
    match outcome {
        LoadOutcome::Spectrum(spectrum) => spectrum,
        LoadOutcome::AxisSelectionNeeded { candidates } => {
            panic!("unexpected ambiguity: {candidates:?}")
        }
    }
}

fn numbered_rows(delimiter: char, decimal_comma: bool) -> String {
    (0..12)
        .map(|i| {
            let field = 100.0 + i as f64 * 10.0;
            let signal = i as f64 * 0.5;
            let mut row = format!("{field:.1}{delimiter}{signal:.2}");
            if decimal_comma {
                row = row.replace('.', ",");
            }
            row
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn standard_csv_with_metadata_header_loads_in_tesla() {
    let dir = TempDir::new().expect("tempdir");
    let content = format!(
        "# Frequency: 9.44 GHz\n# Temperature: 293 K\nField (mT),Signal (dAbs)\n{}\n",
        numbered_rows(',', false)
    );
    let path = write_fixture(&dir, "scan.csv", &content);

    let mut sink = CollectingSink::new();
    let spectrum = expect_spectrum(load_any(&path, &mut sink).expect("load"));

    assert_eq!(spectrum.len(), 12);
    assert!((spectrum.field_b()[0] - 0.100).abs() <= 1.0e-12);
    assert!((spectrum.field_b()[11] - 0.210).abs() <= 1.0e-12);
    assert_eq!(spectrum.signal_dabs()[2], 1.0);
    assert_eq!(spectrum.meta().frequency_hz, Some(9.44e9));
    assert_eq!(spectrum.meta().temperature_k, Some(293.0));
    assert!(sink.events().contains(&DiagnosticEvent::UnitResolved {
        unit: FieldUnit::Millitesla,
        source: UnitSource::Header,
    }));
}

#[test]
fn semicolon_file_with_decimal_commas_loads() {
    let dir = TempDir::new().expect("tempdir");
    let content = format!("Feld [G];Signal\n{}\n", numbered_rows(';', true));
    let path = write_fixture(&dir, "scan.txt", &content);

    let spectrum = expect_spectrum(load_any(&path, &mut NullSink).expect("load"));
    assert_eq!(spectrum.len(), 12);
    // 100 G = 0.01 T
    assert!((spectrum.field_b()[0] - 0.01).abs() <= 1.0e-12);
    assert_eq!(spectrum.signal_dabs()[1], 0.5);
}

#[test]
fn tab_separated_file_loads() {
    let dir = TempDir::new().expect("tempdir");
    let content = format!("Field [T]\tSignal\n{}\n", numbered_rows('\t', false));
    let path = write_fixture(&dir, "scan.tsv", &content);

    let spectrum = expect_spectrum(load_any(&path, &mut NullSink).expect("load"));
    assert_eq!(spectrum.len(), 12);
    assert_eq!(spectrum.field_b()[0], 100.0);
}

#[test]
fn packed_quoted_column_parses_like_the_two_column_case() {
    let dir = TempDir::new().expect("tempdir");
    let rows: String = (0..12)
        .map(|i| format!("\"{}, {}\"", 100 + i * 10, i))
        .collect::<Vec<_>>()
        .join("\n");
    let packed = format!("\"Field(mT),Signal\"\n{rows}\n");
    let packed_path = write_fixture(&dir, "packed.csv", &packed);

    let plain_rows: String = (0..12)
        .map(|i| format!("{},{}", 100 + i * 10, i))
        .collect::<Vec<_>>()
        .join("\n");
    let plain = format!("Field(mT),Signal\n{plain_rows}\n");
    let plain_path = write_fixture(&dir, "plain.csv", &plain);

    let mut sink = CollectingSink::new();
    let from_packed = expect_spectrum(load_any(&packed_path, &mut sink).expect("packed"));
    let from_plain = expect_spectrum(load_any(&plain_path, &mut NullSink).expect("plain"));

    assert_eq!(from_packed.field_b(), from_plain.field_b());
    assert_eq!(from_packed.signal_dabs(), from_plain.signal_dabs());
    assert!((from_packed.field_b()[0] - 0.1).abs() <= 1.0e-12);
    assert!(sink
        .events()
        .iter()
        .any(|e| matches!(e, DiagnosticEvent::PackedColumnSplit { .. })));
}

#[test]
fn unit_only_column_supplies_the_field_unit() {
    let dir = TempDir::new().expect("tempdir");
    let rows: String = (0..12)
        .map(|i| format!("{},{},{}", 100 + i * 10, 100 + i * 10, i))
        .collect::<Vec<_>>()
        .join("\n");
    // The middle column carries no data role; its *name* is the bare unit
    // token for the field axis.
    let content = format!("Field,mT,Signal\n{rows}\n");
    let path = write_fixture(&dir, "units.csv", &content);

    let mut sink = CollectingSink::new();
    let spectrum = expect_spectrum(load_any(&path, &mut sink).expect("load"));
    assert!((spectrum.field_b()[0] - 0.1).abs() <= 1.0e-12);
    assert!(sink.events().contains(&DiagnosticEvent::UnitResolved {
        unit: FieldUnit::Millitesla,
        source: UnitSource::Hint,
    }));
}

#[test]
fn fewer_than_ten_rows_is_insufficient_data() {
    let dir = TempDir::new().expect("tempdir");
    let content = "Field (mT),Signal\n100,1\n200,2\n";
    let path = write_fixture(&dir, "short.csv", content);

    let error = load_any(&path, &mut NullSink).expect_err("short file");
    assert_eq!(
        error,
        EsrError::InsufficientData {
            rows: 2,
            minimum: 10,
        }
    );
}

#[test]
fn unknown_extension_is_unsupported() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_fixture(&dir, "scan.xlsx", "Field,Signal\n1,2\n");

    let error = load_any(&path, &mut NullSink).expect_err("extension");
    assert_eq!(
        error,
        EsrError::UnsupportedFileType {
            extension: "xlsx".to_string(),
        }
    );
}

#[test]
fn missing_file_reports_the_path() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("nope.csv");
    let error = load_any(&path, &mut NullSink).expect_err("missing");
    assert!(matches!(error, EsrError::Io { .. }));
}

#[test]
fn ambiguous_columns_request_selection_and_accept_overrides() {
    let dir = TempDir::new().expect("tempdir");
    let rows: String = (0..12)
        .map(|i| format!("{},{},{}", 100 + i * 10, 500 + i, i))
        .collect::<Vec<_>>()
        .join("\n");
    let content = format!("Field,B,Signal\n{rows}\n");
    let path = write_fixture(&dir, "ambiguous.csv", &content);

    match load_any(&path, &mut NullSink).expect("load") {
        LoadOutcome::AxisSelectionNeeded { candidates } => {
            assert_eq!(candidates, vec!["Field", "B", "Signal"]);
        }
        LoadOutcome::Spectrum(_) => panic!("expected ambiguity"),
    }

    let overrides = AxisOverride {
        field: "B".to_string(),
        signal: "Signal".to_string(),
    };
    let spectrum =
        expect_spectrum(load(&path, Some(&overrides), &mut NullSink).expect("override"));
    assert_eq!(spectrum.field_b()[0], 500.0);
    assert_eq!(spectrum.signal_dabs()[11], 11.0);
}

#[test]
fn text_only_table_has_no_valid_column() {
    let dir = TempDir::new().expect("tempdir");
    let rows: String = (0..12).map(|_| "aa,bb".to_string()).collect::<Vec<_>>().join("\n");
    let content = format!("NoteA,NoteB\n{rows}\n");
    let path = write_fixture(&dir, "notes.csv", &content);

    let error = load_any(&path, &mut NullSink).expect_err("no numbers");
    assert_eq!(error, EsrError::NoValidColumn);
}
