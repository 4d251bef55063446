//! Integration tests for CLI execution using `assert_cmd`.
//!
//! These exercise end-to-end behaviour of the compiled binary: path
//! expansion, issue reporting, exit codes, and in-place fixing.

use anyhow::{Context, Result, ensure};
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};

fn yaml_doctor() -> Command {
    assert_cmd::cargo::cargo_bin_cmd!("yaml-doctor")
}

/// Creates a temporary directory containing one file with the given name
/// and content.
fn workspace_with(name: &str, content: &str) -> Result<TempDir> {
    let temp = tempdir().context("create temp dir")?;
    fs::write(temp.path().join(name), content).with_context(|| format!("write {name}"))?;
    Ok(temp)
}

#[test]
fn clean_file_exits_zero_with_summary() -> Result<()> {
    let temp = workspace_with("clean.yaml", "key: value\n")?;
    yaml_doctor()
        .current_dir(temp.path())
        .arg("clean.yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "0 errors, 0 warnings, 0 fixed in 1 file",
        ));
    Ok(())
}

#[test]
fn errors_exit_nonzero_and_are_listed() -> Result<()> {
    let temp = workspace_with("broken.yaml", "some_key: 'it's broken'\n")?;
    yaml_doctor()
        .current_dir(temp.path())
        .arg("broken.yaml")
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("broken.yaml")
                .and(predicate::str::contains("error"))
                .and(predicate::str::contains("unescaped quote in quoted string")),
        );
    Ok(())
}

#[test]
fn warnings_alone_stay_successful() -> Result<()> {
    let temp = workspace_with("warn.yaml", "key: @value\n")?;
    yaml_doctor()
        .current_dir(temp.path())
        .arg("warn.yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "0 errors, 1 warning, 0 fixed in 1 file",
        ));
    Ok(())
}

#[test]
fn fix_rewrites_the_file_and_reports_fixed() -> Result<()> {
    let temp = workspace_with("fixable.yaml", "some_key: 'it's broken'\n")?;
    yaml_doctor()
        .current_dir(temp.path())
        .args(["--fix", "fixable.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "0 errors, 0 warnings, 1 fixed in 1 file",
        ));
    let rewritten = fs::read_to_string(temp.path().join("fixable.yaml")).context("re-read")?;
    ensure!(
        rewritten == "some_key: 'it''s broken'\n",
        "rewritten: {rewritten:?}"
    );
    Ok(())
}

#[test]
fn directories_are_walked_recursively() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    let nested = temp.path().join("deep").join("deeper");
    fs::create_dir_all(&nested).context("create nested dirs")?;
    fs::write(temp.path().join("top.yaml"), "a: 1\n").context("write top")?;
    fs::write(nested.join("leaf.yml"), "b: 2\n").context("write leaf")?;
    fs::write(nested.join("ignored.txt"), "c: @not checked\n").context("write ignored")?;
    yaml_doctor()
        .current_dir(temp.path())
        .arg(".")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "0 errors, 0 warnings, 0 fixed in 2 files",
        ));
    Ok(())
}

#[test]
fn markdown_front_matter_is_fixed_and_body_preserved() -> Result<()> {
    let page = "---\ntitle: 'what's new'\n---\n# Body stays [untouched]\n";
    let temp = workspace_with("page.md", page)?;
    yaml_doctor()
        .current_dir(temp.path())
        .args(["--fix", "page.md"])
        .assert()
        .success();
    let rewritten = fs::read_to_string(temp.path().join("page.md")).context("re-read")?;
    ensure!(
        rewritten == "---\ntitle: 'what''s new'\n---\n# Body stays [untouched]\n",
        "rewritten: {rewritten:?}"
    );
    Ok(())
}

#[test]
fn markdown_without_front_matter_reports_nothing() -> Result<()> {
    let temp = workspace_with("plain.md", "# Nothing but markdown\n")?;
    yaml_doctor()
        .current_dir(temp.path())
        .arg("plain.md")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "0 errors, 0 warnings, 0 fixed in 1 file",
        ));
    Ok(())
}

#[test]
fn missing_files_land_in_the_unreadable_section() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    yaml_doctor()
        .current_dir(temp.path())
        .arg("absent.yaml")
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("unreadable:").and(predicate::str::contains("absent.yaml")),
        );
    Ok(())
}

#[test]
fn globs_expand_to_matching_files() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    fs::write(temp.path().join("one.yaml"), "a: 1\n").context("write one")?;
    fs::write(temp.path().join("two.yaml"), "b: @two\n").context("write two")?;
    fs::write(temp.path().join("other.txt"), "not yaml\n").context("write other")?;
    yaml_doctor()
        .current_dir(temp.path())
        .arg("*.yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "0 errors, 1 warning, 0 fixed in 2 files",
        ));
    Ok(())
}

#[test]
fn explicit_files_are_checked_regardless_of_extension() -> Result<()> {
    let temp = workspace_with("config.conf", "key: 'oops's\n")?;
    yaml_doctor()
        .current_dir(temp.path())
        .arg("config.conf")
        .assert()
        .failure()
        .stdout(predicate::str::contains("unescaped quote"));
    Ok(())
}

#[test]
fn invocation_without_paths_fails() {
    yaml_doctor().assert().failure();
}

#[test]
fn help_and_version_exit_zero() -> Result<()> {
    yaml_doctor()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--fix"));
    yaml_doctor()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("yaml-doctor"));
    Ok(())
}

#[test]
fn second_fix_pass_changes_nothing() -> Result<()> {
    let temp = workspace_with(
        "twice.yaml",
        "unending_string: \"Didn't you say please,\" I asked.\na_separate_value: \"Indeed.\"\n",
    )?;
    let file = temp.path().join("twice.yaml");
    yaml_doctor()
        .current_dir(temp.path())
        .args(["--fix", "twice.yaml"])
        .assert()
        .success();
    let first_pass = fs::read_to_string(&file).context("read after first pass")?;
    yaml_doctor()
        .current_dir(temp.path())
        .args(["--fix", "twice.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "0 errors, 0 warnings, 0 fixed in 1 file",
        ));
    let second_pass = fs::read_to_string(&file).context("read after second pass")?;
    ensure!(first_pass == second_pass, "fixing must be idempotent");
    Ok(())
}

#[test]
fn reports_name_files_relative_to_invocation() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    let sub = temp.path().join("configs");
    fs::create_dir(&sub).context("create subdir")?;
    fs::write(sub.join("app.yaml"), "k: @v\n").context("write fixture")?;
    yaml_doctor()
        .current_dir(temp.path())
        .arg("configs")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            Path::new("configs").join("app.yaml").display().to_string(),
        ));
    Ok(())
}
