//! Checking files on disk, Markdown front-matter included.
//!
//! `.md` files are split into front-matter and body: only the front-matter
//! is checked, and the body is carried through untouched. When fixing is on
//! the repaired text is written back in place, but only if it actually
//! differs from what was read.

use crate::checker::{self, CheckOptions, CheckReport};
use crate::front_matter;
use miette::Diagnostic;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// I/O faults raised while checking a file.
///
/// YAML faults never land here; they are issues in the [`CheckReport`].
#[derive(Debug, Error, Diagnostic)]
pub enum FileError {
    /// The file could not be read.
    #[error("could not read {path}")]
    #[diagnostic(code(yaml_doctor::files::read))]
    Read {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The repaired content could not be written back.
    #[error("could not write repaired content to {path}")]
    #[diagnostic(code(yaml_doctor::files::write))]
    Write {
        /// The file that was being rewritten.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl FileError {
    /// Whether this is a read failure a batch run records per file instead
    /// of aborting: the file is missing or permissions forbid reading it.
    #[must_use]
    pub fn is_unreadable(&self) -> bool {
        matches!(
            self,
            Self::Read { source, .. } if matches!(
                source.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
            )
        )
    }
}

/// Options accepted by [`check_file`].
#[derive(Clone, Debug)]
pub struct FileOptions {
    /// Produce (and by default write back) repaired file content.
    pub fix: bool,
    /// Allow overwriting the file with its fixed content.
    pub write: bool,
    /// Delete non-printable characters from the fixed output.
    pub remove_invalid_characters: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            fix: false,
            write: true,
            remove_invalid_characters: true,
        }
    }
}

/// Check one file, reading it from disk unless `content` is supplied.
///
/// # Errors
///
/// Returns a [`FileError`] when the file cannot be read or the repaired
/// content cannot be written back. YAML faults are never errors; they
/// arrive as issues in the report.
pub fn check_file(
    path: &Path,
    content: Option<&str>,
    options: &FileOptions,
) -> Result<CheckReport, FileError> {
    let text = match content {
        Some(given) => given.to_owned(),
        None => fs::read_to_string(path).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })?,
    };
    let check_options = CheckOptions {
        fix: options.fix,
        remove_invalid_characters: options.remove_invalid_characters,
        name: Some(path.display().to_string()),
    };
    let report = if path.extension().is_some_and(|extension| extension == "md") {
        check_page(&text, &check_options)
    } else {
        checker::check(&text, &check_options)
    };
    if options.fix
        && options.write
        && let Some(fixed) = report.fixed.as_deref()
        && fixed != text
    {
        debug!(path = %path.display(), "writing repaired file");
        fs::write(path, fixed).map_err(|source| FileError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(report)
}

/// Check the YAML front-matter of a Markdown page.
///
/// A page without front-matter yields no issues and passes through
/// unchanged.
fn check_page(page: &str, options: &CheckOptions) -> CheckReport {
    let (meta, body) = front_matter::split(page);
    if meta.is_empty() {
        debug!("page has no front-matter");
        return CheckReport {
            issues: Vec::new(),
            fixed: options.fix.then(|| page.to_owned()),
        };
    }
    let meta_report = checker::check(meta, options);
    CheckReport {
        issues: meta_report.issues,
        fixed: meta_report
            .fixed
            .map(|fixed_meta| front_matter::join(&fixed_meta, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result, ensure};
    use tempfile::tempdir;

    #[test]
    fn fixes_are_written_back() -> Result<()> {
        let dir = tempdir().context("create temp dir")?;
        let file = dir.path().join("broken.yaml");
        fs::write(&file, "key: @value\n").context("write fixture")?;
        let options = FileOptions {
            fix: true,
            ..FileOptions::default()
        };
        let report = check_file(&file, None, &options).context("check")?;
        ensure!(report.issues.len() == 1, "one issue expected");
        let written = fs::read_to_string(&file).context("re-read")?;
        ensure!(written == "key: \"@value\"\n", "rewritten: {written:?}");
        Ok(())
    }

    #[test]
    fn clean_files_are_left_untouched() -> Result<()> {
        let dir = tempdir().context("create temp dir")?;
        let file = dir.path().join("clean.yaml");
        fs::write(&file, "key: value\n").context("write fixture")?;
        let options = FileOptions {
            fix: true,
            ..FileOptions::default()
        };
        let report = check_file(&file, None, &options).context("check")?;
        ensure!(report.issues.is_empty(), "no issues expected");
        ensure!(
            report.fixed.as_deref() == Some("key: value\n"),
            "fixed content mirrors the input"
        );
        Ok(())
    }

    #[test]
    fn markdown_body_is_preserved() -> Result<()> {
        let page = "---\ntitle: 'what''s up'\n---\n# Body [stays] as-is\n";
        let dir = tempdir().context("create temp dir")?;
        let file = dir.path().join("page.md");
        fs::write(&file, page).context("write fixture")?;
        let report = check_file(&file, None, &FileOptions::default()).context("check")?;
        ensure!(report.issues.is_empty(), "front-matter is valid");
        Ok(())
    }

    #[test]
    fn markdown_without_front_matter_is_passed_through() -> Result<()> {
        let page = "# Heading only\n";
        let options = FileOptions {
            fix: true,
            write: false,
            ..FileOptions::default()
        };
        let report =
            check_file(Path::new("virtual.md"), Some(page), &options).context("check")?;
        ensure!(report.issues.is_empty(), "nothing to report");
        ensure!(report.fixed.as_deref() == Some(page), "page unchanged");
        Ok(())
    }

    #[test]
    fn missing_file_is_classified_unreadable() -> Result<()> {
        let result = check_file(Path::new("no/such/file.yaml"), None, &FileOptions::default());
        let Err(error) = result else {
            anyhow::bail!("expected a read error");
        };
        ensure!(error.is_unreadable(), "classified unreadable: {error}");
        Ok(())
    }
}
