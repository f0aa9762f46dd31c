//! Integration tests for the steady binary
//!
//! Every test gets its own config file in a temp directory.

mod common;

use anyhow::Result;
use tempfile::TempDir;

fn config_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("steady").join("config.toml")
}

#[test]
fn fmt_size_uses_defaults_and_flags() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = config_path(&dir);

    let result = steady!(&cfg, "fmt", "size", "1536").assert_success()?;
    assert_eq!(result.stdout.trim(), "1.5 KB");

    let result = steady!(&cfg, "fmt", "size", "0").assert_success()?;
    assert_eq!(result.stdout.trim(), "0 Bytes");

    let result = steady!(&cfg, "fmt", "size", "1536", "--decimals", "0").assert_success()?;
    assert_eq!(result.stdout.trim(), "2 KB");
    Ok(())
}

#[test]
fn fmt_interval_and_datetime() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = config_path(&dir);

    let result = steady!(&cfg, "fmt", "interval", "125").assert_success()?;
    assert_eq!(result.stdout.trim(), "2m 5s");

    let result = steady!(&cfg, "fmt", "interval", "-5").assert_failure()?;
    assert!(result.contains_stderr("negative"));

    let result = steady!(&cfg, "fmt", "datetime", "2024-03-05T07:08:09", "--pattern", "DD/MM/YYYY")
        .assert_success()?;
    assert_eq!(result.stdout.trim(), "05/03/2024");

    let result = steady!(&cfg, "fmt", "datetime", "yesterday").assert_success()?;
    assert_eq!(result.stdout.trim(), "yesterday");
    Ok(())
}

#[test]
fn config_set_get_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = config_path(&dir);

    let result = steady!(&cfg, "config", "get", "ratelimit.debounce_ms").assert_success()?;
    assert_eq!(result.stdout.trim(), "300");

    steady!(&cfg, "config", "set", "ratelimit.debounce_ms", "120").assert_success()?;
    assert!(cfg.exists());

    let result = steady!(&cfg, "config", "get", "ratelimit.debounce_ms").assert_success()?;
    assert_eq!(result.stdout.trim(), "120");

    // Formatting picks up configured defaults
    steady!(&cfg, "config", "set", "format.size_decimals", "0").assert_success()?;
    let result = steady!(&cfg, "fmt", "size", "1536").assert_success()?;
    assert_eq!(result.stdout.trim(), "2 KB");
    Ok(())
}

#[test]
fn config_rejects_bad_values() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = config_path(&dir);

    steady!(&cfg, "config", "set", "ratelimit.throttle_ms", "0").assert_failure()?;
    steady!(&cfg, "config", "set", "ratelimit.throttle_ms", "soon").assert_failure()?;
    steady!(&cfg, "config", "get", "no.such.key").assert_failure()?;
    assert!(!cfg.exists());
    Ok(())
}

#[test]
fn config_path_create() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = config_path(&dir);

    let result = steady!(&cfg, "config", "path").assert_success()?;
    assert!(result.contains_stdout("does not exist"));

    let result = steady!(&cfg, "config", "path", "--create").assert_success()?;
    assert!(result.contains_stdout("Created config file"));
    assert!(cfg.exists());

    let result = steady!(&cfg, "config", "example").assert_success()?;
    assert!(result.contains_stdout("[ratelimit]"));
    Ok(())
}

#[test]
fn simulate_debounce_reports_last_call_of_each_burst() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = config_path(&dir);

    let result = steady!(
        &cfg, "simulate", "debounce", "--at", "0,100,200,900", "--wait-ms", "300", "--json"
    )
    .assert_success()?;
    let report = result.json()?;

    assert_eq!(report["mode"], "debounce");
    assert_eq!(report["duration_ms"], 300);
    let runs = report["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["call"], 2);
    assert_eq!(runs[0]["at_ms"], 500);
    assert_eq!(runs[1]["call"], 3);
    assert_eq!(runs[1]["at_ms"], 1200);
    Ok(())
}

#[test]
fn simulate_throttle_drops_calls_inside_window() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = config_path(&dir);

    let result = steady!(
        &cfg, "simulate", "throttle", "--at", "0,100,250,300,520", "--limit-ms", "250", "--json"
    )
    .assert_success()?;
    let report = result.json()?;

    let admitted: Vec<bool> = report["calls"]
        .as_array()
        .unwrap()
        .iter()
        .map(|call| call["admitted"].as_bool().unwrap())
        .collect();
    assert_eq!(admitted, vec![true, false, true, false, true]);

    let run_times: Vec<u64> = report["runs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|run| run["at_ms"].as_u64().unwrap())
        .collect();
    assert_eq!(run_times, vec![0, 250, 520]);
    Ok(())
}

#[test]
fn simulate_rejects_misuse() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = config_path(&dir);

    let result = steady!(&cfg, "simulate", "debounce", "--at", "0,10", "--wait-ms", "0")
        .assert_failure()?;
    assert!(result.contains_stderr("greater than zero"));

    let result = steady!(&cfg, "simulate", "throttle", "--at", "50,10").assert_failure()?;
    assert!(result.contains_stderr("non-decreasing"));
    Ok(())
}

#[test]
fn simulate_guard_tracks_forms_independently() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = config_path(&dir);

    let result = steady!(
        &cfg,
        "simulate",
        "guard",
        "settings:input",
        "prompt:input",
        "settings:submit",
        "unload",
        "prompt:submit",
        "unload",
        "--json"
    )
    .assert_success()?;
    let report = result.json()?;

    let steps = report["steps"].as_array().unwrap();
    assert_eq!(steps[3]["unload"]["decision"], "confirm");
    assert_eq!(steps[3]["unload"]["dirty_forms"][0], "prompt");
    assert_eq!(steps[5]["unload"]["decision"], "proceed");
    assert_eq!(report["final_state"]["dirty"], false);
    Ok(())
}

#[test]
fn simulate_guard_ignores_unguarded_forms() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = config_path(&dir);

    let result = steady!(
        &cfg, "simulate", "guard", "search:input", "unload", "--unguarded", "search", "--json"
    )
    .assert_success()?;
    let report = result.json()?;

    assert_eq!(report["steps"][1]["unload"]["decision"], "proceed");
    assert_eq!(report["final_state"]["forms"].as_array().unwrap().len(), 0);

    steady!(&cfg, "simulate", "guard", "search:typed").assert_failure()?;
    Ok(())
}
