//! Command-line behaviour with geodesic-only configurations.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn workspace() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("towers.txt"),
        "Tower export\n\
         Name: North Site, Latitude: 12.3480, Longitude: 67.8900\n\
         Name: Hill Site, Latitude: 12.3800, Longitude: 67.9500\n\
         Name: Broken, Latitude: north, Longitude: 67.0\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("boxes.csv"), "lat,lon,name\n12.3500,67.8900,Box 7\n").unwrap();

    let config = dir.path().join("lastmile.toml");
    std::fs::write(
        &config,
        r#"
[general]
log_level = "warn"

[technologies.wireless]
threshold_m = 500.0
source = "towers.txt"

[technologies.fiber]
threshold_m = 150.0
metric = "geodesic"
source = "boxes.csv"
"#,
    )
    .unwrap();
    (dir, config)
}

fn lastmile(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lastmile").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("LASTMILE_ROUTING_URL")
        .arg("--config")
        .arg(config);
    cmd
}

#[test]
fn check_prints_summary() {
    let (_dir, config) = workspace();
    lastmile(&config)
        .args(["check", "12.3450", "67.8900"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wireless: Feasible (334 m, threshold 500 m)"))
        .stdout(predicate::str::contains("Fiber: Not feasible (556 m, threshold 150 m)"));
}

#[test]
fn check_detailed_names_facilities() {
    let (_dir, config) = workspace();
    lastmile(&config)
        .args(["check", "12.3450", "67.8900", "--detailed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nearest tower: North Site"))
        .stdout(predicate::str::contains("Nearest fiber box: Box 7"));
}

#[test]
fn check_json() {
    let (_dir, config) = workspace();
    let output = lastmile(&config)
        .args(["check", "12.3450", "67.8900", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["verdicts"][0]["technology"], "wireless");
    assert_eq!(report["verdicts"][0]["is_feasible"], true);
    assert_eq!(report["verdicts"][1]["is_feasible"], false);
}

#[test]
fn check_rejects_out_of_range_point() {
    let (_dir, config) = workspace();
    lastmile(&config)
        .args(["check", "95.0", "10.0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn check_accepts_negative_coordinates() {
    let (_dir, config) = workspace();
    lastmile(&config)
        .args(["check", "-33.8688", "151.2093"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wireless: Not feasible"));
}

#[test]
fn check_text_parses_map_url() {
    let (_dir, config) = workspace();
    lastmile(&config)
        .args(["check-text", "https://www.google.com/maps/place/X/@12.345,67.890,15z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Location: 12.345, 67.89"));
}

#[test]
fn check_text_ignores_non_locations() {
    let (_dir, config) = workspace();
    lastmile(&config)
        .args(["check-text", "not a location"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn missing_config_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    lastmile(&dir.path().join("absent.toml"))
        .args(["inspect"])
        .assert()
        .code(3);
}

#[test]
fn inspect_reports_counts() {
    let (_dir, config) = workspace();
    let output = lastmile(&config).args(["inspect", "--json"]).output().unwrap();
    assert!(output.status.success());

    let inspected: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let technologies = inspected["technologies"].as_array().unwrap();
    assert_eq!(technologies[0]["technology"], "wireless");
    assert_eq!(technologies[0]["records"], 2);
    assert_eq!(technologies[0]["skipped"], 1);
    assert_eq!(technologies[1]["records"], 1);
    assert_eq!(inspected["open_access"], true);
}

#[test]
fn serve_answers_json_lines() {
    let (_dir, config) = workspace();
    let input = concat!(
        r#"{"chat_id":"-100","type":"location","latitude":12.345,"longitude":67.89}"#,
        "\n",
        r#"{"chat_id":"-200","type":"text","text":"hello"}"#,
        "\n",
    );
    let output = lastmile(&config).arg("serve").write_stdin(input).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let replies: Vec<serde_json::Value> = stdout.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["chat_id"], "-100");
    assert!(replies[0]["message"].as_str().unwrap().contains("Wireless: Feasible"));
}
