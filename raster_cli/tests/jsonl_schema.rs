use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let method = dir.path().join("method.exp");
    fs::write(&method, "FunctionScanTime,0.386\nDesiXStep,0.1\n").unwrap();
    let toml = format!(
        r#"
[offsets]
startup_delay_s = 0.0

[runner]
point_settle_ms = 1
between_wells_ms = 1
approach_settle_ms = 1

[method]
file = '{}'

[acquisition]
data_directory = '{}'
queue_directory = '{}'
"#,
        method.display(),
        dir.path().join("data").display(),
        dir.path().join("queue").display(),
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn json_cmd(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("raster").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(cfg);
    cmd
}

fn last_json_line(bytes: &[u8]) -> serde_json::Value {
    let text = String::from_utf8_lossy(bytes);
    let line = text.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
    serde_json::from_str(line).unwrap_or_else(|e| panic!("not JSON ({e}): {text}"))
}

/// Validate the JSON summary of a successful run.
#[rstest]
fn json_run_summary_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = json_cmd(&cfg)
        .args(["run", "--name", "j1", "--wells", "A01,A02"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = last_json_line(&out);
    assert_eq!(v["outcome"], "completed");
    assert_eq!(v["name"], "j1");
    assert_eq!(v["selected_wells"], 2);
    assert_eq!(v["completed_wells"], 2);
    assert!(v["runtime_s"].as_f64().unwrap() > 0.0);
}

#[rstest]
fn json_preview_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = json_cmd(&cfg)
        .args(["preview", "--wells", "A01,A02"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = last_json_line(&out);
    assert_eq!(v["plate_type"], "96-well");
    assert_eq!(v["wells"], 2);
    assert_eq!(v["points_per_well"], 0);
    // Empty pattern: setup 12 s + 1 s between wells.
    assert_eq!(v["total_s"].as_f64().unwrap(), 13.0);
    assert_eq!(v["per_well_dwell_s"].as_f64().unwrap(), 1.0);
}

#[rstest]
#[case(&["run", "--name", "j1"], 3, "NoWellsSelected")]
#[case(&["run", "--name", "j1", "--wells", "M01"], 4, "InvalidAddress")]
#[case(&["preview", "--wells", "A13"], 4, "InvalidAddress")]
fn json_error_schema(#[case] args: &[&str], #[case] code: i32, #[case] reason: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = json_cmd(&cfg)
        .args(args)
        .assert()
        .code(code)
        .get_output()
        .stderr
        .clone();
    let v = last_json_line(&out);
    assert_eq!(v["reason"], reason);
    assert_eq!(v["exit_code"], code);
    assert!(v["message"].as_str().unwrap().starts_with("What happened:"));
}

#[rstest]
fn json_wells_lists_every_slot() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = json_cmd(&cfg)
        .arg("wells")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = last_json_line(&out);
    let list = v.as_array().unwrap();
    assert_eq!(list.len(), 96);
    assert_eq!(list[0]["label"], "A01");
    assert_eq!(list[95]["label"], "H12");
}
