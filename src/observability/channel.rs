//! Dated API log channel.
//!
//! The channel is the durable half of request logging: one line per entry,
//! appended to `<prefix>-YYYY-MM-DD.<ext>` and rotated when the UTC date
//! changes. The analyzer reads the same files back.
//!
//! ```text
//! [2026-10-19 12:00:00] api.INFO: API Request {"method":"POST",...}
//! [2026-10-19 12:00:00] api.INFO: API Response {"status":201,...}
//! ```
//!
//! A channel is an explicit handle owned by whoever writes to it; there is
//! no process-wide logger for API entries.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::config::LoggingConfig;

/// Timestamp layout inside the leading brackets of every line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date layout embedded in file names.
pub const FILE_DATE_FORMAT: &str = "%Y-%m-%d";

static DATE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})$").expect("static regex"));

/// Severity written after the channel name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Naming scheme `<prefix>-YYYY-MM-DD.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilePattern {
    prefix: String,
    extension: String,
}

/// Outcome of matching a file name against a [`LogFilePattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNameMatch {
    /// Not a log file of this channel.
    NoMatch,
    /// Shaped like a dated log file; `None` when the date is not a real date.
    Dated(Option<NaiveDate>),
}

impl LogFilePattern {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(&config.file_prefix, &config.extension)
    }

    /// File name for the given date.
    pub fn file_name(&self, date: NaiveDate) -> String {
        format!(
            "{}-{}.{}",
            self.prefix,
            date.format(FILE_DATE_FORMAT),
            self.extension
        )
    }

    /// Match a bare file name (no directory component).
    pub fn match_name(&self, name: &str) -> FileNameMatch {
        let Some(rest) = name
            .strip_prefix(self.prefix.as_str())
            .and_then(|r| r.strip_prefix('-'))
        else {
            return FileNameMatch::NoMatch;
        };
        let Some(date) = rest
            .strip_suffix(self.extension.as_str())
            .and_then(|r| r.strip_suffix('.'))
        else {
            return FileNameMatch::NoMatch;
        };
        if !DATE_SEGMENT.is_match(date) {
            return FileNameMatch::NoMatch;
        }
        FileNameMatch::Dated(NaiveDate::parse_from_str(date, FILE_DATE_FORMAT).ok())
    }
}

/// Error writing to the channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write log line: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to encode log context: {0}")]
    Encode(#[from] serde_json::Error),
}

struct OpenFile {
    date: NaiveDate,
    writer: BufWriter<File>,
}

/// Append-only writer for the dated API log files.
pub struct ApiLogChannel {
    name: String,
    directory: PathBuf,
    pattern: LogFilePattern,
    current: Mutex<Option<OpenFile>>,
}

impl ApiLogChannel {
    /// Create a channel writing into `directory`. The directory is created
    /// on first write.
    pub fn new(name: impl Into<String>, directory: impl AsRef<Path>, pattern: LogFilePattern) -> Self {
        Self {
            name: name.into(),
            directory: directory.as_ref().to_path_buf(),
            pattern,
            current: Mutex::new(None),
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(
            &config.channel,
            &config.directory,
            LogFilePattern::from_config(config),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn pattern(&self) -> &LogFilePattern {
        &self.pattern
    }

    /// Path of the file that receives entries written on `date`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.directory.join(self.pattern.file_name(date))
    }

    pub fn info(&self, message: &str, context: &Value) -> Result<(), ChannelError> {
        self.write(LogLevel::Info, message, context)
    }

    pub fn error(&self, message: &str, context: &Value) -> Result<(), ChannelError> {
        self.write(LogLevel::Error, message, context)
    }

    pub fn write(&self, level: LogLevel, message: &str, context: &Value) -> Result<(), ChannelError> {
        self.write_at(Utc::now(), level, message, context)
    }

    /// Write one entry stamped with `at`.
    pub fn write_at(
        &self,
        at: DateTime<Utc>,
        level: LogLevel,
        message: &str,
        context: &Value,
    ) -> Result<(), ChannelError> {
        let line = format_line(at, &self.name, level, message, context)?;
        let date = at.date_naive();

        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        let needs_open = current.as_ref().map_or(true, |open| open.date != date);
        if needs_open {
            *current = Some(OpenFile {
                date,
                writer: self.open(date)?,
            });
        }

        if let Some(open) = current.as_mut() {
            writeln!(open.writer, "{}", line)?;
            open.writer.flush()?;
        }
        Ok(())
    }

    fn open(&self, date: NaiveDate) -> Result<BufWriter<File>, ChannelError> {
        let path = self.path_for(date);
        fs::create_dir_all(&self.directory).map_err(|source| ChannelError::Open {
            path: path.clone(),
            source,
        })?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ChannelError::Open { path, source })?;
        Ok(BufWriter::new(file))
    }
}

/// Render a single log line. The context is compact JSON so the entry stays
/// on one physical line.
pub fn format_line(
    at: DateTime<Utc>,
    channel: &str,
    level: LogLevel,
    message: &str,
    context: &Value,
) -> Result<String, serde_json::Error> {
    Ok(format!(
        "[{}] {}.{}: {} {}",
        at.format(TIMESTAMP_FORMAT),
        channel,
        level,
        message,
        serde_json::to_string(context)?
    ))
}
