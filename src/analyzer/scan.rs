//! Time-windowed scan over the dated log files.

use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyzer::classify::{classify, contains_ignore_case, parse_timestamp};
use crate::analyzer::files::{clear_logs, discover_log_files, AnalyzerError, LogFile};
use crate::config::LoggingConfig;
use crate::observability::channel::LogFilePattern;

/// Endpoint display filter. `"all"` (any case) disables it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointFilter {
    All,
    Matching(String),
}

impl EndpointFilter {
    pub fn admits(&self, line: &str) -> bool {
        match self {
            EndpointFilter::All => true,
            EndpointFilter::Matching(endpoint) => contains_ignore_case(line, endpoint),
        }
    }
}

impl From<&str> for EndpointFilter {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("all") {
            EndpointFilter::All
        } else {
            EndpointFilter::Matching(value.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub last_hours: u32,
    pub endpoint: EndpointFilter,
    pub errors_only: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            last_hours: 24,
            endpoint: EndpointFilter::All,
            errors_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedEntry {
    pub timestamp: DateTime<Utc>,
    pub is_error: bool,
    pub is_registration: bool,
    pub raw_line: String,
}

/// Per-file scan statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub file: LogFile,
    /// Lines containing the marker.
    pub marker_lines: usize,
}

/// Outcome of one analysis run.
///
/// The counters cover every line inside the time window; `matched_entries`
/// is what survives the display filters.
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub files: Vec<ScannedFile>,
    pub matched_entries: Vec<MatchedEntry>,
    pub error_count: usize,
    pub registration_count: usize,
    pub registration_error_count: usize,
}

impl AnalysisResult {
    /// Percentage of registration lines that are errors, one decimal place.
    /// `None` when there were no registration lines.
    pub fn registration_error_rate(&self) -> Option<f64> {
        if self.registration_count == 0 {
            return None;
        }
        let rate = self.registration_error_count as f64 / self.registration_count as f64 * 100.0;
        Some((rate * 10.0).round() / 10.0)
    }

    /// Displayed entries that are both registration-related and errors.
    pub fn registration_errors(&self) -> impl Iterator<Item = &MatchedEntry> {
        self.matched_entries
            .iter()
            .filter(|e| e.is_registration && e.is_error)
    }
}

/// Batch analyzer over one directory of dated log files.
#[derive(Debug, Clone)]
pub struct LogAnalyzer {
    directory: PathBuf,
    pattern: LogFilePattern,
    marker: String,
}

impl LogAnalyzer {
    pub fn new(directory: impl Into<PathBuf>, pattern: LogFilePattern, marker: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            pattern,
            marker: marker.into(),
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(&config.directory, LogFilePattern::from_config(config), &config.marker)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn discover(&self) -> Result<Vec<LogFile>, AnalyzerError> {
        discover_log_files(&self.directory, &self.pattern)
    }

    pub fn clear(&self, confirmed: bool) -> Result<Vec<PathBuf>, AnalyzerError> {
        clear_logs(&self.directory, &self.pattern, confirmed)
    }

    pub fn analyze(&self, options: &AnalyzeOptions) -> Result<AnalysisResult, AnalyzerError> {
        self.analyze_at(Utc::now(), options)
    }

    /// Analyze with an explicit "now", for reproducible windows.
    pub fn analyze_at(&self, now: DateTime<Utc>, options: &AnalyzeOptions) -> Result<AnalysisResult, AnalyzerError> {
        let files = self.discover()?;
        // Windows reaching past the representable range cover everything.
        let cutoff = Duration::try_hours(i64::from(options.last_hours))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut result = AnalysisResult::default();

        for file in files {
            let bytes = fs::read(&file.path).map_err(|source| AnalyzerError::Io {
                path: file.path.clone(),
                source,
            })?;
            let contents = String::from_utf8_lossy(&bytes);

            let mut marker_lines = 0;
            for line in contents.lines() {
                if line.is_empty() || !contains_ignore_case(line, &self.marker) {
                    continue;
                }
                marker_lines += 1;

                let Some(timestamp) = parse_timestamp(line) else {
                    continue;
                };
                if timestamp < cutoff || timestamp > now {
                    continue;
                }

                let class = classify(line);
                if class.is_registration {
                    result.registration_count += 1;
                    if class.is_error {
                        result.registration_error_count += 1;
                    }
                }
                if class.is_error {
                    result.error_count += 1;
                }

                if options.errors_only && !class.is_error {
                    continue;
                }
                if !options.endpoint.admits(line) {
                    continue;
                }

                result.matched_entries.push(MatchedEntry {
                    timestamp,
                    is_error: class.is_error,
                    is_registration: class.is_registration,
                    raw_line: line.to_string(),
                });
            }

            tracing::debug!(file = %file.path.display(), marker_lines, "Scanned log file");
            result.files.push(ScannedFile { file, marker_lines });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fmt::Write as _;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn stamp(at: DateTime<Utc>) -> String {
        at.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn analyzer(dir: &Path) -> LogAnalyzer {
        LogAnalyzer::new(dir, LogFilePattern::new("api", "log"), "api")
    }

    #[test]
    fn counters_and_display_filters_are_separate() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = String::new();
        for i in 0..24 {
            let at = stamp(now() - Duration::minutes(10 + i));
            if i < 3 {
                writeln!(log, r#"[{at}] api.ERROR: API Exception {{"url":"/api/register","message":"error {i}"}}"#).unwrap();
            } else {
                writeln!(log, r#"[{at}] api.INFO: API Request {{"uri":"/api/roles"}}"#).unwrap();
            }
        }
        fs::write(dir.path().join("api-2026-10-19.log"), log).unwrap();

        let all = analyzer(dir.path()).analyze_at(now(), &AnalyzeOptions::default()).unwrap();
        assert_eq!(all.matched_entries.len(), 24);
        assert_eq!(all.error_count, 3);
        assert_eq!(all.registration_count, 3);
        assert_eq!(all.registration_error_count, 3);
        assert_eq!(all.registration_error_rate(), Some(100.0));
        assert_eq!(all.registration_errors().count(), 3);

        let errors = analyzer(dir.path())
            .analyze_at(
                now(),
                &AnalyzeOptions {
                    errors_only: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(errors.matched_entries.len(), 3);
        assert!(errors.matched_entries.iter().all(|e| e.is_error));
        assert_eq!(errors.error_count, all.error_count);
        assert_eq!(errors.registration_count, all.registration_count);

        let roles = analyzer(dir.path())
            .analyze_at(
                now(),
                &AnalyzeOptions {
                    endpoint: EndpointFilter::from("/API/ROLES"),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(roles.matched_entries.len(), 21);
        assert_eq!(roles.registration_error_count, 3);
    }

    #[test]
    fn window_excludes_old_and_future_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = format!(
            "[{}] api.INFO: old\n[{}] api.INFO: edge\n[{}] api.INFO: recent\n[{}] api.INFO: future\n",
            stamp(now() - Duration::hours(3)),
            stamp(now() - Duration::hours(2)),
            stamp(now() - Duration::minutes(5)),
            stamp(now() + Duration::minutes(5)),
        );
        fs::write(dir.path().join("api-2026-10-19.log"), log).unwrap();

        let result = analyzer(dir.path())
            .analyze_at(
                now(),
                &AnalyzeOptions {
                    last_hours: 2,
                    ..Default::default()
                },
            )
            .unwrap();

        let kept: Vec<&str> = result.matched_entries.iter().map(|e| e.raw_line.as_str()).collect();
        assert_eq!(kept.len(), 2);
        assert!(kept[0].ends_with("edge"));
        assert!(kept[1].ends_with("recent"));
    }

    #[test]
    fn huge_window_covers_all_history() {
        let dir = tempfile::tempdir().unwrap();
        let log = format!(
            "[1970-01-01 00:00:01] api.INFO: epoch\n[{}] api.INFO: recent\n",
            stamp(now() - Duration::minutes(5)),
        );
        fs::write(dir.path().join("api-2026-10-19.log"), log).unwrap();

        let result = analyzer(dir.path())
            .analyze_at(
                now(),
                &AnalyzeOptions {
                    last_hours: u32::MAX,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(result.matched_entries.len(), 2);
    }

    #[test]
    fn marker_and_timestamp_gate_lines() {
        let dir = tempfile::tempdir().unwrap();
        let at = stamp(now() - Duration::minutes(1));
        let log = format!(
            "[{at}] local.INFO: cache warmed\n\
             Stack trace: #0 /srv/api/handler failed\n\
             \n\
             [{at}] api.INFO: API Response {{\"status\":200}}\n"
        );
        fs::write(dir.path().join("api-2026-10-19.log"), log).unwrap();

        let result = analyzer(dir.path()).analyze_at(now(), &AnalyzeOptions::default()).unwrap();
        assert_eq!(result.matched_entries.len(), 1);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.files[0].marker_lines, 2);
    }

    #[test]
    fn files_are_scanned_newest_first_without_resorting() {
        let dir = tempfile::tempdir().unwrap();
        let today = now() - Duration::hours(1);
        let yesterday = now() - Duration::hours(20);
        fs::write(
            dir.path().join("api-2026-10-18.log"),
            format!("[{}] api.INFO: from yesterday\n", stamp(yesterday)),
        )
        .unwrap();
        fs::write(
            dir.path().join("api-2026-10-19.log"),
            format!("[{}] api.INFO: from today\n", stamp(today)),
        )
        .unwrap();

        let result = analyzer(dir.path()).analyze_at(now(), &AnalyzeOptions::default()).unwrap();
        let order: Vec<DateTime<Utc>> = result.matched_entries.iter().map(|e| e.timestamp).collect();
        assert_eq!(order, vec![today, yesterday]);
    }

    #[test]
    fn no_files_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            analyzer(dir.path()).analyze_at(now(), &AnalyzeOptions::default()),
            Err(AnalyzerError::NoLogFilesFound { .. })
        ));
    }

    #[test]
    fn rate_rounds_to_one_decimal() {
        let result = AnalysisResult {
            registration_count: 3,
            registration_error_count: 1,
            ..Default::default()
        };
        assert_eq!(result.registration_error_rate(), Some(33.3));
        assert_eq!(AnalysisResult::default().registration_error_rate(), None);
    }
}
