//! Log file discovery and clearing.

use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::observability::channel::{FileNameMatch, LogFilePattern};

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("No log files found in {}", dir.display())]
    NoLogFilesFound { dir: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A dated log file. `date` is `None` when the name has the dated shape but
/// the date itself is not a calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    pub date: Option<NaiveDate>,
}

impl LogFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// List the files in `dir` named like `pattern`, newest date first.
///
/// Files whose date does not parse sort after every dated file. Equal dates
/// are ordered by path so repeated calls return the same order.
pub fn discover_log_files(dir: &Path, pattern: &LogFilePattern) -> Result<Vec<LogFile>, AnalyzerError> {
    let mut files = matching_files(dir, pattern)?;
    if files.is_empty() {
        return Err(AnalyzerError::NoLogFilesFound { dir: dir.to_path_buf() });
    }

    files.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

/// Truncate every log file in `dir` to zero length.
///
/// Does nothing unless `confirmed`. Returns the paths that were cleared.
pub fn clear_logs(dir: &Path, pattern: &LogFilePattern, confirmed: bool) -> Result<Vec<PathBuf>, AnalyzerError> {
    if !confirmed {
        return Ok(Vec::new());
    }

    let mut cleared = Vec::new();
    for file in matching_files(dir, pattern)? {
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&file.path)
            .map_err(|source| AnalyzerError::Io {
                path: file.path.clone(),
                source,
            })?;
        tracing::info!(path = %file.path.display(), "Cleared log file");
        cleared.push(file.path);
    }
    cleared.sort();
    Ok(cleared)
}

fn matching_files(dir: &Path, pattern: &LogFilePattern) -> Result<Vec<LogFile>, AnalyzerError> {
    let io_err = |source| AnalyzerError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_err(e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(io_err)?;
        if !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let FileNameMatch::Dated(date) = pattern.match_name(name) {
            files.push(LogFile {
                path: entry.path(),
                date,
            });
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> LogFilePattern {
        LogFilePattern::new("api", "log")
    }

    fn touch(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn newest_first_with_invalid_dates_last() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "api-2026-10-17.log", "");
        touch(dir.path(), "api-2026-10-19.log", "");
        touch(dir.path(), "api-2026-13-45.log", "");
        touch(dir.path(), "api-2026-10-18.log", "");
        touch(dir.path(), "laravel-2026-10-19.log", "");
        touch(dir.path(), "api-2026-10-19.log.gz", "");
        touch(dir.path(), "notes.txt", "");

        let names: Vec<String> = discover_log_files(dir.path(), &pattern())
            .unwrap()
            .iter()
            .map(LogFile::file_name)
            .collect();

        assert_eq!(
            names,
            ["api-2026-10-19.log", "api-2026-10-18.log", "api-2026-10-17.log", "api-2026-13-45.log"]
        );
    }

    #[test]
    fn discovery_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "api-0000-13-01.log", "");
        touch(dir.path(), "api-2026-99-99.log", "");
        touch(dir.path(), "api-2026-10-19.log", "");

        let first = discover_log_files(dir.path(), &pattern()).unwrap();
        let second = discover_log_files(dir.path(), &pattern()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_or_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_log_files(dir.path(), &pattern()),
            Err(AnalyzerError::NoLogFilesFound { .. })
        ));
        assert!(matches!(
            discover_log_files(&dir.path().join("absent"), &pattern()),
            Err(AnalyzerError::NoLogFilesFound { .. })
        ));
    }

    #[test]
    fn clear_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "api-2026-10-19.log", "line\n");

        assert!(clear_logs(dir.path(), &pattern(), false).unwrap().is_empty());
        assert_eq!(fs::read_to_string(dir.path().join("api-2026-10-19.log")).unwrap(), "line\n");
    }

    #[test]
    fn clear_truncates_matching_files_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "api-2026-10-19.log", "line\n");
        touch(dir.path(), "api-2026-10-18.log", "older\n");
        touch(dir.path(), "other.log", "keep\n");

        let cleared = clear_logs(dir.path(), &pattern(), true).unwrap();
        assert_eq!(cleared.len(), 2);

        assert!(dir.path().join("api-2026-10-19.log").exists());
        assert_eq!(fs::read_to_string(dir.path().join("api-2026-10-19.log")).unwrap(), "");
        assert_eq!(fs::read_to_string(dir.path().join("api-2026-10-18.log")).unwrap(), "");
        assert_eq!(fs::read_to_string(dir.path().join("other.log")).unwrap(), "keep\n");
    }
}
