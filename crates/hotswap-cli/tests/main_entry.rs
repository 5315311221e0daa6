//! Integration tests for the `hotswap` binary entry point.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

const LISTENER: &str = r#"
[[attribute]]
name = "listen"
capability = "loader"
units = [{ kind = "listener", name = "on-message" }]

[[attribute]]
name = "stop"
capability = "unloader"
units = [{ kind = "listener", name = "on-message" }]
"#;

#[test]
fn load_prints_registered_units() {
    let dir = TempDir::new().expect("create temp dir");
    let module = dir.path().join("listener.toml");
    std::fs::write(&module, LISTENER).expect("write module");

    let mut command = cargo_bin_cmd!("hotswap");
    command.arg("load").arg(&module);
    command
        .assert()
        .success()
        .stdout(contains("load: listener:on-message"));
}

#[test]
fn cycle_ends_with_no_units() {
    let dir = TempDir::new().expect("create temp dir");
    let module = dir.path().join("listener.toml");
    std::fs::write(&module, LISTENER).expect("write module");

    let mut command = cargo_bin_cmd!("hotswap");
    command.args(["--output", "json", "cycle"]).arg(&module);
    command
        .assert()
        .success()
        .stdout(contains(r#"{"phase":"unload","units":[]}"#));
}

#[test]
fn missing_module_exits_with_failure() {
    let dir = TempDir::new().expect("create temp dir");

    let mut command = cargo_bin_cmd!("hotswap");
    command.arg("load").arg(dir.path().join("absent.toml"));
    command
        .assert()
        .failure()
        .stderr(contains("could not be found"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let mut command = cargo_bin_cmd!("hotswap");
    command.assert().code(2);
}
