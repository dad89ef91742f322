//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::PathBuf;

/// Build command for the timingguard-cli binary with provider keys cleared,
/// so no test ever reaches a live backend.
fn timingguard_cli() -> Command {
    let mut cmd = cargo_bin_cmd!("timingguard-cli");
    cmd.env_remove("GROQ_API_KEY")
        .env_remove("CEREBRAS_API_KEY")
        .env_remove("COHERE_API_KEY");
    cmd
}

/// Path to timingguard library test fixtures (relative to workspace).
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("timingguard")
        .join("tests")
        .join("fixtures")
}

#[test]
fn test_cli_help() {
    let mut cmd = timingguard_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Timing report"));
}

#[test]
fn test_cli_version() {
    let mut cmd = timingguard_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_analyze_offline() {
    let mut cmd = timingguard_cli();
    let path = fixtures_dir().join("vivado_violations.rpt");

    cmd.arg("analyze").arg(path).arg("--offline");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("P1 slack -2.513 ns"))
        .stdout(predicate::str::contains("Retime / pipeline"))
        .stdout(predicate::str::contains("Floorplan / placement"))
        .stdout(predicate::str::contains("Summary:"))
        .stdout(predicate::str::contains("Violations:   3"))
        .stdout(predicate::str::contains("set_output_delay"));
}

#[test]
fn test_cli_analyze_without_backends_still_answers() {
    let mut cmd = timingguard_cli();
    let path = fixtures_dir().join("path_listing.rpt");

    cmd.arg("analyze").arg(path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Source: heuristic"));
}

#[test]
fn test_cli_analyze_json_output() {
    let mut cmd = timingguard_cli();
    let path = fixtures_dir().join("vivado_violations.rpt");

    cmd.arg("analyze")
        .arg(path)
        .arg("--offline")
        .arg("--format")
        .arg("json");

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["metrics"]["violation_count"], 3);
    assert_eq!(json["results"].as_array().unwrap().len(), 3);
    assert_eq!(json["results"][0]["path_id"], "P1");
    assert_eq!(json["paths"].as_array().unwrap().len(), 4);
}

#[test]
fn test_cli_github_format() {
    let mut cmd = timingguard_cli();
    let path = fixtures_dir().join("vivado_violations.rpt");

    cmd.arg("analyze")
        .arg(path)
        .arg("--offline")
        .arg("--format")
        .arg("github");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("::error file="))
        .stdout(predicate::str::contains("retime_or_pipeline"))
        .stdout(predicate::str::contains("::warning file="));
}

#[test]
fn test_cli_fail_on_violations() {
    let mut cmd = timingguard_cli();
    let path = fixtures_dir().join("vivado_violations.rpt");

    cmd.arg("analyze")
        .arg(path)
        .arg("--offline")
        .arg("--fail-on-violations");

    cmd.assert().code(2);
}

#[test]
fn test_cli_met_report_passes() {
    let mut cmd = timingguard_cli();
    let path = fixtures_dir().join("vivado_met.rpt");

    cmd.arg("analyze")
        .arg(path)
        .arg("--offline")
        .arg("--fail-on-violations");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No timing violations"));
}

#[test]
fn test_cli_malformed_report() {
    let mut cmd = timingguard_cli();
    let path = fixtures_dir().join("malformed.rpt");

    cmd.arg("analyze").arg(path).arg("--offline");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("No recognizable timing path blocks"));
}

#[test]
fn test_cli_nonexistent_file() {
    let mut cmd = timingguard_cli();

    cmd.arg("analyze").arg("nonexistent.rpt").arg("--offline");

    cmd.assert().failure().stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_parse_command() {
    let mut cmd = timingguard_cli();
    let path = fixtures_dir().join("path_listing.rpt");

    cmd.arg("parse").arg(path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Path listing"))
        .stdout(predicate::str::contains("WNS:        -1.850 ns"))
        .stdout(predicate::str::contains("fir/tap_reg[4]"));
}

#[test]
fn test_cli_parse_json() {
    let mut cmd = timingguard_cli();
    let path = fixtures_dir().join("vivado_violations.rpt");

    cmd.arg("parse").arg(path).arg("--format").arg("json");

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["layout"], "vivado");
    assert_eq!(json["paths"].as_array().unwrap().len(), 4);
    assert_eq!(json["constraint_gaps"].as_array().unwrap().len(), 2);
}

#[test]
fn test_cli_rules_command() {
    let mut cmd = timingguard_cli();

    cmd.arg("rules");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("deep_logic"))
        .stdout(predicate::str::contains("clock_domain_crossing"));
}

#[test]
fn test_cli_rules_detailed() {
    let mut plain = timingguard_cli();
    let plain_out = plain.arg("rules").output().unwrap();

    let mut detailed = timingguard_cli();
    let detailed_out = detailed.arg("rules").arg("--detailed").output().unwrap();

    assert!(detailed_out.status.success());
    assert!(detailed_out.stdout.len() > plain_out.stdout.len());
}

#[test]
fn test_cli_config_thresholds() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "[thresholds]\ndeep_logic_levels = 20").unwrap();

    let mut cmd = timingguard_cli();
    let path = fixtures_dir().join("vivado_violations.rpt");

    cmd.arg("analyze")
        .arg(path)
        .arg("--config")
        .arg(config.path())
        .arg("--offline")
        .arg("--format")
        .arg("json");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("retime_or_pipeline").not())
        .stdout(predicate::str::contains("floorplan"));
}

#[test]
fn test_cli_bad_config() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "max_concurrency = \"many\"").unwrap();

    let mut cmd = timingguard_cli();
    let path = fixtures_dir().join("vivado_violations.rpt");

    cmd.arg("analyze").arg(path).arg("--config").arg(config.path());

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("loading config"));
}

#[test]
fn test_cli_groups_output_bus() {
    let mut cmd = timingguard_cli();
    let path = fixtures_dir().join("vivado_unconstrained.rpt");

    cmd.arg("analyze").arg(path).arg("--offline");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("P3 slack -0.731 ns  out/y_reg[7]/C -> y[7]  (reg->out)"))
        .stdout(predicate::str::contains("Signal groups:"))
        .stdout(predicate::str::contains("y[7:6,4] (reg->out): 3 path(s), worst P3 at -0.731 ns"))
        .stdout(predicate::str::contains("IOB TRUE"))
        .stdout(predicate::str::contains("dbg/tap_reg").not());
}
