use std::fs;

use assert_cmd::Command;
use golden::cli::UPDATE_ENV;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn golden_cmd() -> Command {
    let mut cmd = Command::cargo_bin("golden").unwrap();
    cmd.env_remove(UPDATE_ENV);
    cmd
}

#[test]
fn matching_input_succeeds() {
    let dir = TempDir::new().unwrap();
    let golden = dir.path().join("world.txt");
    let input = dir.path().join("actual.txt");
    fs::write(&golden, "Hello, World!").unwrap();
    fs::write(&input, "Hello, World!").unwrap();

    golden_cmd()
        .arg(&golden)
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .stdout(contains("ok"));
}

#[test]
fn mismatch_prints_the_diff_and_fails() {
    let dir = TempDir::new().unwrap();
    let golden = dir.path().join("world.txt");
    fs::write(&golden, "Hello, World!").unwrap();

    golden_cmd()
        .arg(&golden)
        .write_stdin("Oh noes!")
        .assert()
        .code(1)
        .stdout(contains("-Hello, World!").and(contains("+Oh noes!")))
        .stderr(contains("does not match"));
}

#[test]
fn update_rewrites_the_golden_file() {
    let dir = TempDir::new().unwrap();
    let golden = dir.path().join("world.txt");
    fs::write(&golden, "Hello, World!").unwrap();

    golden_cmd()
        .arg(&golden)
        .arg("--update")
        .write_stdin("Oh noes!")
        .assert()
        .success()
        .stdout(contains("updated"));

    assert_eq!(fs::read_to_string(&golden).unwrap(), "Oh noes!");
}

#[test]
fn whitespace_option_is_honoured() {
    let dir = TempDir::new().unwrap();
    let golden = dir.path().join("doc.txt");
    fs::write(&golden, "a b\r\nc").unwrap();

    golden_cmd()
        .arg(&golden)
        .args(["-w", "-E"])
        .write_stdin("ab\nc")
        .assert()
        .success();
}

#[test]
fn missing_golden_file_is_an_error() {
    let dir = TempDir::new().unwrap();

    golden_cmd()
        .arg(dir.path().join("missing.txt"))
        .write_stdin("x")
        .assert()
        .failure()
        .stderr(contains("Failed to check"));
}

#[test]
fn invalid_chunk_size_is_rejected() {
    let dir = TempDir::new().unwrap();

    golden_cmd()
        .arg(dir.path().join("world.txt"))
        .args(["--chunk-size", "0"])
        .write_stdin("x")
        .assert()
        .failure()
        .stderr(contains("Invalid chunk size"));
}
