// Integration tests drive the compiled binary as a subprocess.
use predicates::prelude::*;

fn kickoff_cmd(cwd: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("kickoff").unwrap();
    cmd.current_dir(cwd)
        .env("NO_COLOR", "1")
        .env_remove("KICKOFF_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_verbose_flag() {
    let dir = tempfile::tempdir().unwrap();

    kickoff_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--verbose"));
}

#[test]
fn prints_version() {
    let dir = tempfile::tempdir().unwrap();

    kickoff_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn rejects_unknown_flags() {
    let dir = tempfile::tempdir().unwrap();

    kickoff_cmd(dir.path()).arg("--force").assert().failure();
}

#[test]
fn missing_git_aborts_before_prompting() {
    let dir = tempfile::tempdir().unwrap();

    kickoff_cmd(dir.path())
        .env("PATH", "")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("init stage"))
        .stderr(predicate::str::contains("git is required to run this generator"));

    let created = walkdir::WalkDir::new(dir.path()).min_depth(1).into_iter().count();
    assert_eq!(created, 0);
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("broken.toml");
    std::fs::write(&config, "templates = [").unwrap();

    kickoff_cmd(dir.path())
        .env("KICKOFF_CONFIG", &config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parsing error"));
}
