//! End-to-end CLI tests for the annotate command.
//!
//! These tests run the actual `utrext annotate` binary and validate:
//! 1. The extended annotation and metrics outputs
//! 2. GTF output
//! 3. Option validation failures

use std::fs;
use std::process::Command;
use tempfile::TempDir;

use crate::helpers::write_inputs;

fn annotate_command(inputs: &crate::helpers::Inputs, output: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_utrext"));
    cmd.args([
        "annotate",
        "--peaks",
        inputs.peaks.to_str().unwrap(),
        "--annotation",
        inputs.annotation.to_str().unwrap(),
        "--cache-dir",
        inputs.cache_dir.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);
    cmd
}

#[test]
fn test_annotate_command_gff3() {
    let temp_dir = TempDir::new().unwrap();
    let inputs = write_inputs(temp_dir.path());
    let output = temp_dir.path().join("extended.gff3");
    let metrics = temp_dir.path().join("annotate.metrics.txt");

    let status = annotate_command(&inputs, &output)
        .args(["--threads", "2", "--metrics", metrics.to_str().unwrap()])
        .status()
        .expect("Failed to run annotate command");
    assert!(status.success(), "annotate command failed");

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.starts_with("##gff-version 3\n"));
    let utr = content.lines().find(|l| l.contains("ID=utr_1;Parent=t1")).unwrap();
    let fields: Vec<_> = utr.split('\t').collect();
    assert_eq!(&fields[1..5], &["utrext", "three_prime_UTR", "2000", "2300"]);
    assert!(fields[8].ends_with("colour=4"));
    assert!(content.contains("ID=g2"));

    let metrics = fs::read_to_string(&metrics).unwrap();
    let mut lines = metrics.lines();
    let header: Vec<_> = lines.next().unwrap().split('\t').collect();
    let values: Vec<_> = lines.next().unwrap().split('\t').collect();
    let value = |name: &str| values[header.iter().position(|h| *h == name).unwrap()];
    assert_eq!(value("total_peaks"), "5");
    assert_eq!(value("utrs_annotated"), "2");
    assert_eq!(value("peaks_zero_coverage"), "1");
}

#[test]
fn test_annotate_command_gtf_out() {
    let temp_dir = TempDir::new().unwrap();
    let inputs = write_inputs(temp_dir.path());
    let output = temp_dir.path().join("extended.gtf");

    let status = annotate_command(&inputs, &output)
        .args(["--gtf-out", "--threads", "1"])
        .status()
        .expect("Failed to run annotate command");
    assert!(status.success());

    let content = fs::read_to_string(&output).unwrap();
    assert!(!content.contains("\tgene\t"));
    assert!(content.lines().any(|l| l.contains("\ttranscript\t") && l.contains("\"t2\"")));
    assert!(
        content
            .lines()
            .any(|l| l.contains("three_prime_UTR") && l.contains(r#"gene_id "g3"; transcript_id "t3";"#))
    );
}

#[test]
fn test_annotate_command_rejects_conflicting_policies() {
    let temp_dir = TempDir::new().unwrap();
    let inputs = write_inputs(temp_dir.path());
    let output = temp_dir.path().join("extended.gff3");

    let status = annotate_command(&inputs, &output)
        .args(["--override-utr", "--extend-utr"])
        .status()
        .expect("Failed to run annotate command");
    assert!(!status.success());
    assert!(!output.exists());
}

#[test]
fn test_annotate_command_rejects_zero_memory_limit() {
    let temp_dir = TempDir::new().unwrap();
    let inputs = write_inputs(temp_dir.path());
    let output = temp_dir.path().join("extended.gff3");

    let result = annotate_command(&inputs, &output)
        .args(["--max-memory", "0"])
        .output()
        .expect("Failed to run annotate");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("--max-memory"));
    assert!(!output.exists());
}

#[test]
fn test_annotate_command_missing_cache_dir() {
    let temp_dir = TempDir::new().unwrap();
    let mut inputs = write_inputs(temp_dir.path());
    inputs.cache_dir = temp_dir.path().join("no-such-cache");
    let output = temp_dir.path().join("extended.gff3");

    let result = annotate_command(&inputs, &output).output().expect("Failed to run annotate");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("cache-dir"));
}
