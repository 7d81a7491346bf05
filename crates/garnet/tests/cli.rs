use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn garnet() -> Command {
    Command::cargo_bin("garnet").expect("cargo bin garnet")
}

fn write(root: &Path, name: &str, contents: &str) {
    fs::write(root.join(name), contents).expect("write fixture file");
}

#[test]
fn check_reports_diagnostics_and_exits_nonzero_on_errors() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "app.rb", "x = 1\nmissing_method_call\n");

    garnet()
        .arg("check")
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "undefined local variable or method 'missing_method_call'",
        ))
        .stdout(predicate::str::contains("unused local variable x"));
}

#[test]
fn warnings_alone_exit_zero() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "app.rb", "leftover = 1\n");

    garnet()
        .arg("check")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("unused local variable leftover"))
        .stdout(predicate::str::contains("0 errors, 1 warnings"));
}

#[test]
fn clean_trees_print_only_the_summary() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "ok.rb", "total = 2\nputs total\n");

    garnet()
        .arg("check")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("checked 1 files"))
        .stdout(predicate::str::contains("0 errors, 0 warnings"));
}

#[test]
fn json_output_is_parseable_and_locates_diagnostics() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "app.rb", "y = 5\n");

    let assert = garnet()
        .arg("check")
        .arg(dir.path())
        .args(["--format", "json"])
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("stdout should be JSON");
    assert_eq!(json["diagnostics"][0]["severity"], "warning");
    assert_eq!(json["diagnostics"][0]["message"], "unused local variable y");
    assert!(
        json["diagnostics"][0]["file"]
            .as_str()
            .expect("file should be a string")
            .ends_with("app.rb")
    );
    assert_eq!(json["summary"]["warnings"], 1);
}

#[test]
fn a_config_file_narrows_the_analyses() {
    let dir = TempDir::new().expect("temp dir");
    write(
        dir.path(),
        "garnet.toml",
        "[analysis]\nenabled = [\"unused-variables\"]\n",
    );
    write(dir.path(), "app.rb", "z = 1\nwhatever_call\n");

    garnet()
        .arg("check")
        .arg(dir.path())
        .arg("--config")
        .arg(dir.path().join("garnet.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("unused local variable z"))
        .stdout(predicate::str::contains("undefined").not());
}

#[test]
fn syntax_errors_are_reported_per_file_and_fail_the_run() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "bad.rb", "def broken(\n");
    write(dir.path(), "good.rb", "puts 1\n");

    garnet()
        .arg("check")
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("bad.rb"))
        .stdout(predicate::str::contains("invalid syntax"));
}

#[test]
fn dump_ast_prints_the_lowered_tree() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "one.rb", "puts 1\n");

    garnet()
        .arg("dump-ast")
        .arg(dir.path().join("one.rb"))
        .assert()
        .success()
        .stdout(predicate::str::contains("(send nil :puts [(int 1)])"));
}

#[test]
fn analyses_lists_every_kind_with_a_summary() {
    garnet()
        .arg("analyses")
        .assert()
        .success()
        .stdout(predicate::str::contains("unused-variables"))
        .stdout(predicate::str::contains("undefined-methods"))
        .stdout(predicate::str::contains("argument-count"))
        .stdout(predicate::str::contains("shadowing"))
        .stdout(predicate::str::contains("never read"));
}
