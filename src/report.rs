//! Console rendering of issues and batch summaries.
//!
//! All output goes through a caller-supplied writer so tests can capture
//! it; colour is an explicit flag, resolved once by the runner from the
//! terminal state.

use crate::issue::{Issue, Level};
use colored::Colorize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Running totals across a batch of checked files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Issues still at error level.
    pub errors: usize,
    /// Issues still at warning level.
    pub warnings: usize,
    /// Issues repaired in the output.
    pub fixed: usize,
    /// Files checked.
    pub files: usize,
}

impl BatchSummary {
    /// Fold one file's issues into the totals.
    pub fn absorb(&mut self, issues: &[Issue]) {
        self.files += 1;
        for issue in issues {
            match issue.level {
                Level::Error => self.errors += 1,
                Level::Warning => self.warnings += 1,
                Level::Fixed => self.fixed += 1,
            }
        }
    }
}

fn paint(text: &str, level: Level, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match level {
        Level::Error => text.red().bold().to_string(),
        Level::Warning => text.yellow().bold().to_string(),
        Level::Fixed => text.green().bold().to_string(),
    }
}

/// Write a file's path and one line per issue; clean files print nothing.
///
/// # Errors
///
/// Propagates failures of the underlying writer.
pub fn write_file_issues(
    out: &mut dyn Write,
    path: &Path,
    issues: &[Issue],
    color: bool,
) -> io::Result<()> {
    if issues.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}", path.display())?;
    for issue in issues {
        let location = format!("{}:{}", issue.mark.line + 1, issue.mark.column + 1);
        let label = format!("{:<8}", issue.level.to_string());
        writeln!(
            out,
            "  {location:>7}  {}{}",
            paint(&label, issue.level, color),
            issue.reason
        )?;
    }
    writeln!(out)?;
    Ok(())
}

/// Write the section listing files that could not be read.
///
/// # Errors
///
/// Propagates failures of the underlying writer.
pub fn write_unreadable(
    out: &mut dyn Write,
    failures: &[(PathBuf, io::Error)],
    color: bool,
) -> io::Result<()> {
    if failures.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}", paint("unreadable:", Level::Error, color))?;
    for (path, error) in failures {
        writeln!(out, "  {}: {error}", path.display())?;
    }
    writeln!(out)?;
    Ok(())
}

fn count(quantity: usize, noun: &str) -> String {
    if quantity == 1 {
        format!("{quantity} {noun}")
    } else {
        format!("{quantity} {noun}s")
    }
}

/// Write the trailing `N errors, M warnings, K fixed in F files` line.
///
/// # Errors
///
/// Propagates failures of the underlying writer.
pub fn write_summary(out: &mut dyn Write, summary: &BatchSummary) -> io::Result<()> {
    writeln!(
        out,
        "{}, {}, {} fixed in {}",
        count(summary.errors, "error"),
        count(summary.warnings, "warning"),
        summary.fixed,
        count(summary.files, "file"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Mark;
    use anyhow::{Context, Result, ensure};

    fn sample_issue(level: Level, reason: &str) -> Issue {
        Issue::new(level, reason, Mark::in_source("key: value", 5, None))
    }

    #[test]
    fn issue_lines_carry_location_level_and_reason() -> Result<()> {
        let mut out = Vec::new();
        let issues = vec![sample_issue(Level::Error, "something is off")];
        write_file_issues(&mut out, Path::new("a.yaml"), &issues, false)
            .context("write issues")?;
        let text = String::from_utf8(out).context("utf8")?;
        ensure!(text.starts_with("a.yaml\n"), "path header first: {text:?}");
        ensure!(
            text.contains("1:6  error   something is off"),
            "issue line: {text:?}"
        );
        Ok(())
    }

    #[test]
    fn clean_files_print_nothing() -> Result<()> {
        let mut out = Vec::new();
        write_file_issues(&mut out, Path::new("a.yaml"), &[], false).context("write")?;
        ensure!(out.is_empty(), "no output expected");
        Ok(())
    }

    #[test]
    fn summary_pluralises() -> Result<()> {
        let mut out = Vec::new();
        let summary = BatchSummary {
            errors: 1,
            warnings: 2,
            fixed: 3,
            files: 1,
        };
        write_summary(&mut out, &summary).context("write")?;
        let text = String::from_utf8(out).context("utf8")?;
        ensure!(
            text == "1 error, 2 warnings, 3 fixed in 1 file\n",
            "summary: {text:?}"
        );
        Ok(())
    }

    #[test]
    fn totals_absorb_issue_levels() {
        let mut summary = BatchSummary::default();
        summary.absorb(&[
            sample_issue(Level::Error, "a"),
            sample_issue(Level::Fixed, "b"),
            sample_issue(Level::Fixed, "c"),
        ]);
        summary.absorb(&[]);
        assert_eq!(
            summary,
            BatchSummary {
                errors: 1,
                warnings: 0,
                fixed: 2,
                files: 2
            }
        );
    }
}
