//! CLI execution and batch policy.
//!
//! This module keeps `main` minimal: it expands the command-line paths
//! (directories walk recursively, everything else is tried as a glob before
//! falling back to a literal path), checks each file in order, renders the
//! per-file reports and summary, and decides whether the run counts as
//! clean.

use crate::cli::Cli;
use crate::files::{self, FileError, FileOptions};
use crate::report::{self, BatchSummary};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// File extensions picked up when a directory is expanded.
const CHECKED_EXTENSIONS: [&str; 3] = ["yaml", "yml", "md"];

/// What a run found, driving the process exit code.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Issue totals across every checked file.
    pub summary: BatchSummary,
    /// Files that could not be read, with the error for each.
    pub unreadable: Vec<(PathBuf, io::Error)>,
}

impl RunOutcome {
    /// A run is clean when something was checked, nothing was unreadable,
    /// and no error-level issue survived. Warnings and fixes are not
    /// fatal.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.summary.errors == 0 && self.unreadable.is_empty() && self.summary.files > 0
    }
}

/// Execute the parsed [`Cli`], writing reports to `out`.
///
/// # Errors
///
/// Returns an error for faults that abort the batch: report-writer
/// failures and I/O errors other than a file being missing or unreadable
/// (those are recorded per file instead).
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<RunOutcome> {
    let color = io::stdout().is_terminal();
    let paths = collect_paths(&cli.paths);
    debug!(files = paths.len(), fix = cli.fix, "collected paths");
    let options = FileOptions {
        fix: cli.fix,
        write: true,
        remove_invalid_characters: true,
    };
    let mut outcome = RunOutcome::default();
    for path in &paths {
        debug!(path = %path.display(), "checking");
        match files::check_file(path, None, &options) {
            Ok(file_report) => {
                outcome.summary.absorb(&file_report.issues);
                report::write_file_issues(out, path, &file_report.issues, color)
                    .context("write report")?;
            }
            Err(FileError::Read { source, .. })
                if matches!(
                    source.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
                ) =>
            {
                outcome.unreadable.push((path.clone(), source));
            }
            Err(error) => {
                return Err(error).with_context(|| format!("check {}", path.display()));
            }
        }
    }
    report::write_unreadable(out, &outcome.unreadable, color).context("write report")?;
    report::write_summary(out, &outcome.summary).context("write report")?;
    Ok(outcome)
}

/// Expand arguments into a sorted, deduplicated list of files to check.
fn collect_paths(arguments: &[String]) -> Vec<PathBuf> {
    let mut collected = BTreeSet::new();
    for argument in arguments {
        let as_path = Path::new(argument);
        if as_path.is_dir() {
            collect_directory(as_path, &mut collected);
        } else {
            collect_pattern(argument, &mut collected);
        }
    }
    collected.into_iter().collect()
}

fn collect_directory(root: &Path, collected: &mut BTreeSet<PathBuf>) {
    for entry in WalkDir::new(root).into_iter().filter_map(|entry| entry.ok()) {
        if entry.file_type().is_file() && has_checked_extension(entry.path()) {
            collected.insert(entry.into_path());
        }
    }
}

fn has_checked_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            CHECKED_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
        })
}

/// Glob-expand one argument; files named explicitly are checked whatever
/// their extension. An argument matching nothing is kept literally so the
/// missing file shows up in the unreadable section.
fn collect_pattern(argument: &str, collected: &mut BTreeSet<PathBuf>) {
    let mut matched = false;
    if let Ok(entries) = glob::glob(argument) {
        for entry in entries.filter_map(|entry| entry.ok()) {
            matched = true;
            if entry.is_dir() {
                collect_directory(&entry, collected);
            } else {
                collected.insert(entry);
            }
        }
    }
    if !matched {
        collected.insert(PathBuf::from(argument));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result, ensure};
    use std::fs;
    use tempfile::tempdir;

    fn cli_for(paths: Vec<String>, fix: bool) -> Cli {
        Cli {
            paths,
            fix,
            debug: false,
        }
    }

    #[test]
    fn directories_expand_to_yaml_and_markdown() -> Result<()> {
        let dir = tempdir().context("create temp dir")?;
        fs::write(dir.path().join("a.yaml"), "a: 1\n").context("write a")?;
        fs::write(dir.path().join("b.yml"), "b: 2\n").context("write b")?;
        fs::write(dir.path().join("c.md"), "# no front matter\n").context("write c")?;
        fs::write(dir.path().join("d.txt"), "not checked\n").context("write d")?;
        let collected = collect_paths(&[dir.path().display().to_string()]);
        ensure!(collected.len() == 3, "collected {collected:?}");
        Ok(())
    }

    #[test]
    fn missing_paths_are_reported_not_fatal() -> Result<()> {
        let mut out = Vec::new();
        let cli = cli_for(vec!["definitely-missing.yaml".into()], false);
        let outcome = run(&cli, &mut out).context("run")?;
        ensure!(!outcome.is_clean(), "missing file fails the run");
        ensure!(outcome.unreadable.len() == 1, "one unreadable entry");
        let text = String::from_utf8(out).context("utf8")?;
        ensure!(text.contains("unreadable:"), "section header: {text:?}");
        Ok(())
    }

    #[test]
    fn issues_roll_up_into_the_summary() -> Result<()> {
        let dir = tempdir().context("create temp dir")?;
        let file = dir.path().join("bad.yaml");
        fs::write(&file, "key: @value\n").context("write fixture")?;
        let mut out = Vec::new();
        let cli = cli_for(vec![file.display().to_string()], false);
        let outcome = run(&cli, &mut out).context("run")?;
        ensure!(
            outcome.summary.warnings == 1,
            "one warning: {:?}",
            outcome.summary
        );
        ensure!(outcome.is_clean(), "warnings alone stay clean");
        let text = String::from_utf8(out).context("utf8")?;
        ensure!(
            text.contains("0 errors, 1 warning, 0 fixed in 1 file"),
            "summary: {text:?}"
        );
        Ok(())
    }
}
