use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const RECOMPILE_CONFIG: &str = r#"
version = 1

[exposure]
enabled = true
mode = "curve"

[[exposure.keys]]
time = 0.0
value = 0.0

[[exposure.keys]]
time = 1.0
value = 1.0

[host]
frame_interval = "1ms"
frames = 6

[[host.events]]
frame = 2
event = "recompile_begin"

[[host.events]]
frame = 3
event = "recompile_end"
"#;

fn evhost(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_evhost"))
        .env("EVHOST_CONFIG_DIR", config_dir)
        .env_remove("EVHOST_CONFIG")
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run evhost")
}

fn write_config(root: &TempDir, contents: &str) -> String {
    let path = root.path().join("curve.toml");
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn run_reports_suspension_window_as_json() {
    let root = TempDir::new().unwrap();
    let config = write_config(&root, RECOMPILE_CONFIG);

    let output = evhost(
        root.path(),
        &["--config", &config, "run", "--format", "json"],
    );
    assert!(output.status.success(), "{:?}", output);

    let report: Value = serde_json::from_slice(&output.stdout).expect("json report");
    let frames = report["frames"].as_array().expect("frames");
    let outcomes: Vec<&str> = frames
        .iter()
        .map(|frame| frame["outcome"].as_str().unwrap_or("-"))
        .collect();
    assert_eq!(
        outcomes,
        ["published", "published", "suspended", "resumed", "published", "published"]
    );
    assert_eq!(frames[2]["enabled_flag"], 0);
    assert_eq!(frames[3]["enabled_flag"], 0);
    assert_eq!(frames[4]["enabled_flag"], 1);

    let globals = &report["globals"]["values"];
    assert_eq!(globals["_ToonEvAdjustmentCurve"], 1);
    assert_eq!(globals["_ToonEvAdjustmentValueMin"], 0.0);
    assert_eq!(globals["_ToonEvAdjustmentValueMax"], 1.0);
    assert_eq!(
        globals["_ToonEvAdjustmentValueArray"]
            .as_array()
            .map(Vec::len),
        Some(128)
    );
}

#[test]
fn sample_resamples_configured_curve() {
    let root = TempDir::new().unwrap();
    let config = write_config(&root, RECOMPILE_CONFIG);

    let output = evhost(
        root.path(),
        &["--config", &config, "sample", "--count", "5", "--format", "json"],
    );
    assert!(output.status.success(), "{:?}", output);

    let table: Value = serde_json::from_slice(&output.stdout).expect("json table");
    let samples: Vec<f64> = table["samples"]
        .as_array()
        .expect("samples")
        .iter()
        .map(|value| value.as_f64().unwrap())
        .collect();
    let expected = [0.0, 0.25, 0.5, 0.75, 1.0];
    assert_eq!(samples.len(), expected.len());
    for (actual, expected) in samples.iter().zip(expected) {
        assert!((actual - expected).abs() < 1e-5, "{samples:?}");
    }
    assert_eq!(table["min_time"], 0.0);
    assert_eq!(table["max_time"], 1.0);
}

#[test]
fn discovers_config_in_config_dir() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("evhost.toml"),
        "version = 1\n\n[host]\nframes = 2\n",
    )
    .unwrap();

    let output = evhost(root.path(), &["run"]);
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 4, "{stdout}");

    let output = evhost(root.path(), &["where"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("evhost.toml"));
    assert!(stdout.contains("discovered, present"));
}

#[test]
fn invalid_config_fails() {
    let root = TempDir::new().unwrap();
    let config = write_config(
        &root,
        "version = 1\n\n[[exposure.keys]]\ntime = 2.0\nvalue = 0.0\n\n[[exposure.keys]]\ntime = 1.0\nvalue = 0.0\n",
    );

    let output = evhost(root.path(), &["--config", &config, "run"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("keys must be sorted by time"), "{stderr}");
}
