use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use api_monitor::analyzer::{
    render_report, report, AnalyzeOptions, AnalyzerError, EndpointFilter, LogAnalyzer, ReportOptions,
};
use api_monitor::config::{load_config, AppConfig};
use api_monitor::observability::logging;

#[derive(Parser)]
#[command(name = "analyze-api-logs")]
#[command(about = "Analyze API logs for troubleshooting", long_about = None)]
struct Cli {
    /// Analyze logs from the last N hours
    #[arg(long, default_value_t = 24)]
    last_hours: u32,

    /// Specific API endpoint to analyze
    #[arg(long, default_value = "all")]
    endpoint: String,

    /// Show only errors
    #[arg(long)]
    errors_only: bool,

    /// Clear log files before analysis
    #[arg(long)]
    clear: bool,

    /// Skip the confirmation prompt for --clear
    #[arg(long)]
    yes: bool,

    /// Log directory, overriding the configuration
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_tracing("api_monitor=warn");

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &cli.log_dir {
        config.logging.directory = dir.display().to_string();
    }
    let analyzer = LogAnalyzer::from_config(&config.logging);

    if cli.clear {
        let confirmed = cli.yes || confirm("This will clear all log files. Are you sure?")?;
        let cleared = analyzer.clear(confirmed)?;
        for path in &cleared {
            println!("Cleared: {}", path.display());
        }
        if confirmed {
            println!("All log files cleared.");
        }
    }

    println!("API Log Analysis Tool");
    println!("{}", report::RULE);
    println!("Analyzing logs in: {}", analyzer.directory().display());

    let options = AnalyzeOptions {
        last_hours: cli.last_hours,
        endpoint: EndpointFilter::from(cli.endpoint.as_str()),
        errors_only: cli.errors_only,
    };

    let result = match analyzer.analyze(&options) {
        Ok(result) => result,
        Err(AnalyzerError::NoLogFilesFound { .. }) => {
            eprintln!("No log files found.");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    println!("Found {} log files.", result.files.len());
    println!("{}", report::describe_scope(&options));
    for scanned in &result.files {
        println!("Analyzing {}...", scanned.file.file_name());
        if scanned.marker_lines == 0 {
            eprintln!("No API entries found in {}", scanned.file.file_name());
        }
    }
    println!();
    print!("{}", render_report(&result, &ReportOptions::default()));

    Ok(ExitCode::SUCCESS)
}

fn confirm(question: &str) -> io::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
