// tests/cli_test.rs
//
// Runs the streamdecode binary against generated files.

mod test_utils;

use test_utils::*;

#[test]
fn test_json_report_for_wav() {
    let (file, _) = write_wav_i16("cli_json", 2, 44100, 20000);

    let output = run_streamdecode(file.path())
        .arg("--json")
        .output()
        .expect("Failed to execute with json flag");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let report = &reports[0];
    assert_eq!(report["output"]["sample_rate"], 44100);
    assert_eq!(report["output"]["sample_format"], "s16");
    assert_eq!(report["rewind"]["first"]["samples"], 20000);
    assert_eq!(
        report["rewind"]["first"]["digest"],
        report["rewind"]["second"]["digest"]
    );
    assert!(report.get("error").is_none());
}

#[test]
fn test_info_dump_in_text_output() {
    let (file, _) = write_wav_i16("cli_info", 1, 8000, 8000);

    let output = run_streamdecode(file.path())
        .arg("--info")
        .output()
        .expect("Failed to execute with info flag");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 stream(s) found:"));
    assert!(stdout.contains("CONSISTENT"));
}

#[test]
fn test_undecodable_file_fails() {
    let garbage = TempFile::new("cli_garbage", "wav");
    std::fs::write(garbage.path(), b"not a riff header").unwrap();

    let output = run_streamdecode(garbage.path())
        .arg("--json")
        .output()
        .expect("Failed to execute");
    assert!(!output.status.success());

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert!(reports[0]["error"].is_string());
}

#[test]
fn test_missing_input_is_an_error() {
    let missing = TempFile::new("cli_missing", "wav");
    let output = run_streamdecode(missing.path())
        .output()
        .expect("Failed to execute");
    assert_eq!(output.status.code(), Some(2));
}
