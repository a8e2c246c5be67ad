use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn esr_lab() -> Command {
    Command::new(env!("CARGO_BIN_EXE_esr-lab"))
}

fn write_scan(dir: &TempDir, name: &str) -> PathBuf {
    let rows: String = (0..101)
        .map(|i| {
            let b_mt = 330.0 + 0.18 * i as f64;
            let u = (b_mt - 339.0) / 0.8;
            let signal = -2.0 * u / (1.0 + u * u).powi(2);
            format!("{b_mt:.3},{signal:.6}")
        })
        .collect::<Vec<_>>()
        .join("\n");
    let content = format!("# Frequency: 9.50 GHz\nField (mT),Signal (dAbs)\n{rows}\n");
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

#[test]
fn info_reports_points_and_metadata_as_json() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_scan(&dir, "scan.csv");

    let output = esr_lab()
        .args(["info", "--json"])
        .arg(&path)
        .output()
        .expect("run esr-lab");
    assert!(output.status.success(), "{output:?}");

    let value: Value =
        serde_json::from_slice(&output.stdout).expect("info output should be JSON");
    assert_eq!(value["points"], 101);
    assert_eq!(value["meta"]["frequency_hz"], 9.5e9);
    let min = value["field_min_T"].as_f64().expect("min");
    assert!((min - 0.330).abs() <= 1.0e-9, "min {min}");
}

#[test]
fn process_writes_a_csv_with_absorption() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_scan(&dir, "scan.csv");
    let out_path = dir.path().join("processed.csv");

    let output = esr_lab()
        .args(["process", "--baseline", "poly", "--baseline-order", "1"])
        .args(["--area", "--output"])
        .arg(&out_path)
        .arg(&path)
        .output()
        .expect("run esr-lab");
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("area:"), "stdout: {stdout}");

    let written = fs::read_to_string(&out_path).expect("read output");
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some("field_T,signal,absorption"));
    assert_eq!(lines.count(), 101);
}

#[test]
fn report_emits_derived_scalars() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_scan(&dir, "scan.csv");

    let output = esr_lab()
        .args(["report", "--baseline-order", "1"])
        .arg(&path)
        .output()
        .expect("run esr-lab");
    assert!(output.status.success(), "{output:?}");

    let value: Value =
        serde_json::from_slice(&output.stdout).expect("report should be JSON");
    let b0 = value["B0_T"].as_f64().expect("B0");
    assert!((b0 - 0.339).abs() <= 5.0e-4, "B0 {b0}");
    let g = value["g_factor"].as_f64().expect("g");
    assert!((1.9..2.1).contains(&g), "g {g}");
    assert!(value["T2_s"].as_f64().expect("T2") > 0.0);
}

#[test]
fn ambiguous_axes_exit_with_code_one_and_candidates() {
    let dir = TempDir::new().expect("tempdir");
    let rows: String = (0..12)
        .map(|i| format!("{},{},{}", 100 + i, 200 + i, i))
        .collect::<Vec<_>>()
        .join("\n");
    let content = format!("Field,B,Signal\n{rows}\n");
    let path = dir.path().join("ambiguous.csv");
    fs::write(&path, content).expect("write fixture");

    let output = esr_lab().arg("info").arg(&path).output().expect("run esr-lab");
    assert_eq!(output.status.code(), Some(1), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Candidates"), "stderr: {stderr}");

    let output = esr_lab()
        .args(["info", "--x", "Field", "--y", "Signal"])
        .arg(&path)
        .output()
        .expect("run esr-lab");
    assert!(output.status.success(), "{output:?}");
}

#[test]
fn unsupported_extension_fails_with_code_two() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("scan.xlsx");
    fs::write(&path, "Field,Signal\n1,2\n").expect("write fixture");

    let output = esr_lab().arg("info").arg(&path).output().expect("run esr-lab");
    assert_eq!(output.status.code(), Some(2), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported file type"), "stderr: {stderr}");
}

#[test]
fn invalid_smoothing_window_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_scan(&dir, "scan.csv");

    let output = esr_lab()
        .args(["process", "--smooth-window", "4"])
        .arg(&path)
        .output()
        .expect("run esr-lab");
    assert_eq!(output.status.code(), Some(2), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("positive odd integer"),
        "stderr: {stderr}"
    );
}
