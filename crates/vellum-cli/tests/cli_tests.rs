//! Integration tests for the `vellum` CLI binary.
//!
//! Exercises the validate, pretty, and minify subcommands through the actual
//! binary: stdin/stdout piping, file I/O, the --strict switch, and error
//! reporting.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn sample_json_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample.json")
}

fn extended_json_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/extended.json")
}

#[test]
fn validate_accepts_valid_stdin() {
    Command::cargo_bin("vellum")
        .unwrap()
        .arg("validate")
        .write_stdin(r#"{"a": [1, 2.5, null]}"#)
        .assert()
        .success();
}

#[test]
fn validate_rejects_malformed_input() {
    Command::cargo_bin("vellum")
        .unwrap()
        .arg("validate")
        .write_stdin(r#"{"a": 1,}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON"));
}

#[test]
fn validate_reports_position_of_lex_errors() {
    Command::cargo_bin("vellum")
        .unwrap()
        .arg("validate")
        .write_stdin("{\n  \"a\": 007\n}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn validate_accepts_extensions_by_default() {
    Command::cargo_bin("vellum")
        .unwrap()
        .args(["validate", "-i", extended_json_path()])
        .assert()
        .success();
}

#[test]
fn strict_mode_rejects_extensions() {
    Command::cargo_bin("vellum")
        .unwrap()
        .args(["validate", "--strict", "-i", extended_json_path()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lexical error"));
}

#[test]
fn pretty_normalizes_extensions_to_standard_json() {
    Command::cargo_bin("vellum")
        .unwrap()
        .args(["pretty", "-i", extended_json_path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"host\": \"localhost\""))
        .stdout(predicate::str::contains("//").not());
}

#[test]
fn minify_compacts_stdin_to_stdout() {
    Command::cargo_bin("vellum")
        .unwrap()
        .arg("minify")
        .write_stdin("{ \"a\" : 1 ,\n \"b\" : [ true , null ] }")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"a":1,"b":[true,null]}"#));
}

#[test]
fn pretty_file_to_file_round_trips() {
    let dir = std::env::temp_dir();
    let out_path = dir.join("vellum_cli_pretty_out.json");
    let out = out_path.to_str().unwrap();

    Command::cargo_bin("vellum")
        .unwrap()
        .args(["pretty", "-i", sample_json_path(), "-o", out])
        .assert()
        .success();

    let written = std::fs::read_to_string(out).unwrap();
    assert!(written.contains("\"name\": \"vellum\""));

    // Minifying the pretty output reproduces the key order.
    Command::cargo_bin("vellum")
        .unwrap()
        .args(["minify", "-i", out])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(r#"{"name":"vellum","version":3"#));

    let _ = std::fs::remove_file(out);
}

#[test]
fn missing_input_file_fails_with_context() {
    Command::cargo_bin("vellum")
        .unwrap()
        .args(["validate", "-i", "/nonexistent/input.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}
