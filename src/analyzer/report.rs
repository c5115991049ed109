//! Text report for an [`AnalysisResult`].

use std::borrow::Cow;
use std::fmt::Write;

use crate::analyzer::scan::{AnalysisResult, AnalyzeOptions, EndpointFilter};
use crate::observability::channel::TIMESTAMP_FORMAT;

pub const RULE: &str = "================================";

/// Printed after the registration error table.
pub const RECOMMENDATIONS: &[&str] = &[
    "Check that your server is correctly processing POST requests to /api/register",
    "Verify that the request headers include the correct Content-Type (application/json or multipart/form-data if uploading files)",
    "Test if the route is accessible using a simple request to /api/register-test",
    "Check server configuration for any rewrite rules that might be affecting API routes",
    "Check that CORS is properly configured for your production domain",
    "Run the diagnostics endpoint to verify API connectivity: /api/diagnostics",
];

pub const NO_ENTRIES_WARNING: &str = "No relevant log entries found for the selected criteria.";

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Characters of each raw line shown in the detail table.
    pub detail_width: usize,
    /// Characters shown in the registration error table.
    pub registration_detail_width: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            detail_width: 100,
            registration_detail_width: 1000,
        }
    }
}

/// Cut `entry` to `max_chars` characters, appending `...` when shortened.
pub fn truncate_entry(entry: &str, max_chars: usize) -> Cow<'_, str> {
    match entry.char_indices().nth(max_chars) {
        None => Cow::Borrowed(entry),
        Some((end, _)) => Cow::Owned(format!("{}...", &entry[..end])),
    }
}

/// One-line description of the analysis scope.
pub fn describe_scope(options: &AnalyzeOptions) -> String {
    let mut scope = format!("Analyzing logs from the last {} hours", options.last_hours);
    if let EndpointFilter::Matching(endpoint) = &options.endpoint {
        let _ = write!(scope, " for endpoint '{}'", endpoint);
    }
    if options.errors_only {
        scope.push_str(" (errors only)");
    }
    scope
}

/// Render the summary, the detail tables and, when registration errors
/// were seen, the troubleshooting recommendations.
pub fn render_report(result: &AnalysisResult, options: &ReportOptions) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Analysis Summary");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Total API logs analyzed: {}", result.matched_entries.len());
    let _ = writeln!(out, "Total errors found: {}", result.error_count);
    let _ = writeln!(out, "Registration requests: {}", result.registration_count);
    let _ = writeln!(out, "Registration errors: {}", result.registration_error_count);
    if let Some(rate) = result.registration_error_rate() {
        let _ = writeln!(out, "Registration error rate: {}%", rate);
    }

    if result.matched_entries.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{NO_ENTRIES_WARNING}");
        return out;
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Detailed Analysis");
    let _ = writeln!(out, "{RULE}");
    let rows: Vec<Vec<String>> = result
        .matched_entries
        .iter()
        .map(|entry| {
            vec![
                entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                if entry.is_error { "ERROR" } else { "INFO" }.to_string(),
                truncate_entry(&entry.raw_line, options.detail_width).into_owned(),
            ]
        })
        .collect();
    out.push_str(&render_table(&["Timestamp", "Type", "Log Entry"], &rows));

    if result.registration_error_count > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "Registration Errors Found");
        let _ = writeln!(out, "{RULE}");
        let rows: Vec<Vec<String>> = result
            .registration_errors()
            .map(|entry| {
                vec![
                    entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    truncate_entry(&entry.raw_line, options.registration_detail_width).into_owned(),
                ]
            })
            .collect();
        out.push_str(&render_table(&["Timestamp", "Error Details"], &rows));

        let _ = writeln!(out);
        let _ = writeln!(out, "Troubleshooting Recommendations");
        let _ = writeln!(out, "{RULE}");
        for (i, line) in RECOMMENDATIONS.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, line);
        }
    }

    out
}

/// Boxed ASCII table. Widths are measured in characters.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = {
        let mut line = String::from("+");
        for width in &widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    };

    let mut out = String::new();
    let _ = writeln!(out, "{border}");
    let _ = writeln!(out, "{}", render_row(headers.iter().copied(), &widths));
    let _ = writeln!(out, "{border}");
    for row in rows {
        let _ = writeln!(out, "{}", render_row(row.iter().map(String::as_str), &widths));
    }
    let _ = writeln!(out, "{border}");
    out
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.zip(widths) {
        let pad = width - cell.chars().count();
        let _ = write!(line, " {}{} |", cell, " ".repeat(pad));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::scan::MatchedEntry;
    use chrono::{TimeZone, Utc};

    fn entry(line: &str, is_error: bool, is_registration: bool) -> MatchedEntry {
        MatchedEntry {
            timestamp: Utc.with_ymd_and_hms(2026, 10, 19, 9, 15, 0).unwrap(),
            is_error,
            is_registration,
            raw_line: line.to_string(),
        }
    }

    #[test]
    fn truncation_is_char_safe() {
        assert_eq!(truncate_entry("short", 100), "short");
        assert_eq!(truncate_entry("abcdef", 3), "abc...");
        assert_eq!(truncate_entry("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_entry("exact", 5), "exact");
    }

    #[test]
    fn empty_result_renders_warning_only() {
        let report = render_report(&AnalysisResult::default(), &ReportOptions::default());
        assert!(report.contains(NO_ENTRIES_WARNING));
        assert!(!report.contains("Detailed Analysis"));
        assert!(!report.contains('+'));
        assert!(!report.contains("Registration error rate"));
    }

    #[test]
    fn registration_errors_add_recommendations() {
        let long = format!("[2026-10-19 09:15:00] api.ERROR: registration failed {}", "x".repeat(200));
        let result = AnalysisResult {
            matched_entries: vec![
                entry("[2026-10-19 09:15:00] api.INFO: API Request /api/roles", false, false),
                entry(&long, true, true),
            ],
            error_count: 1,
            registration_count: 2,
            registration_error_count: 1,
            ..Default::default()
        };

        let report = render_report(&result, &ReportOptions::default());
        assert!(report.contains("Registration error rate: 50%"));
        assert!(report.contains("| Timestamp           | Type  |"));
        assert!(report.contains("Registration Errors Found"));
        assert!(report.contains(&long));
        for line in RECOMMENDATIONS {
            assert!(report.contains(line));
        }
    }

    #[test]
    fn no_recommendations_without_registration_errors() {
        let result = AnalysisResult {
            matched_entries: vec![entry("[2026-10-19 09:15:00] api.ERROR: boom", true, false)],
            error_count: 1,
            ..Default::default()
        };
        let report = render_report(&result, &ReportOptions::default());
        assert!(report.contains("Detailed Analysis"));
        assert!(!report.contains("Troubleshooting Recommendations"));
    }

    #[test]
    fn scope_description() {
        let options = AnalyzeOptions {
            last_hours: 6,
            endpoint: EndpointFilter::from("/api/register"),
            errors_only: true,
        };
        assert_eq!(
            describe_scope(&options),
            "Analyzing logs from the last 6 hours for endpoint '/api/register' (errors only)"
        );
    }
}
