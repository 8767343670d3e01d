use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("tubescribe").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("transcribe"))
        .stdout(predicate::str::contains("audio"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn invalid_identifier_fails_before_any_network_call() {
    let config_home = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("tubescribe").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .args(["transcribe", "definitely not a video"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized video URL or id"));
}

#[test]
fn config_show_prints_defaults() {
    let config_home = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("tubescribe").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env_remove("GEMINI_API_KEY")
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Gemini model"))
        .stdout(predicate::str::contains("Poll interval: 5s"));
}
