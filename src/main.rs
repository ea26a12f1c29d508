//! CLI entry point for the sheet grader.
//!
//! Evaluates the students of a course spreadsheet and writes each student's
//! situation and final-exam threshold back to the sheet. Also evaluates a
//! single student or a local CSV export, and runs the one-time OAuth
//! authorization that produces `token.json`.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use sheet_grader::{
    batch::{BatchOutcome, BatchProcessor, WriteOutcome},
    config::SheetLayout,
    evaluator::{Evaluator, StatusLabels},
    fetch::{BasicClient, auth::Bearer},
    infra::{
        csv_source::CsvSource,
        google::{ClientSecrets, SheetsClient, oauth},
    },
    output::append_report,
    parser::ParseMode,
    record::EvaluatedRecord,
    services::DiscardSink,
};
use std::ffi::OsStr;
use std::io::BufRead;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "sheet_grader")]
#[command(about = "Computes pass/fail situations for a course spreadsheet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EvalOptions {
    /// Reject malformed numeric cells instead of reading their numeric prefix
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Language of the status labels written to the sheet
    #[arg(long, value_enum, default_value = "english")]
    labels: StatusLabels,

    /// CSV file to append evaluated records to
    #[arg(short, long)]
    report: Option<String>,
}

impl EvalOptions {
    fn mode(&self) -> ParseMode {
        if self.strict {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one student from the command line
    Evaluate {
        /// Number of missed sessions
        #[arg(short, long)]
        absences: u32,

        /// The three exam scores, 0 to 10
        #[arg(required = true, num_args = 3, value_names = ["P1", "P2", "P3"], allow_negative_numbers = true)]
        scores: Vec<f64>,
    },
    /// Evaluate every student in the spreadsheet and write the results back
    Sync {
        /// Spreadsheet to process (overrides the layout file)
        #[arg(long, env = "SPREADSHEET_ID")]
        spreadsheet_id: Option<String>,

        /// JSON file describing sheet name, rows and columns
        #[arg(short, long)]
        layout: Option<String>,

        /// Saved OAuth credentials produced by `authorize`
        #[arg(short, long, default_value = "token.json")]
        token: String,

        #[command(flatten)]
        options: EvalOptions,
    },
    /// Evaluate a local CSV export (name,absences,score1,score2,score3) without writing back
    Local {
        /// CSV file to read
        #[arg(value_name = "FILE")]
        input: String,

        #[command(flatten)]
        options: EvalOptions,
    },
    /// Authorize spreadsheet access and save the refresh token
    Authorize {
        /// OAuth client file downloaded from the Google Cloud console
        #[arg(short, long, default_value = "credentials.json")]
        credentials: String,

        /// Where to save the authorized credentials
        #[arg(short, long, default_value = "token.json")]
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/sheet_grader.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("sheet_grader.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate { absences, scores } => {
            let evaluation = Evaluator::default().evaluate(absences, scores[0], scores[1], scores[2]);
            info!(
                absences,
                average = evaluation.average,
                status = %evaluation.status,
                threshold = evaluation.final_exam_threshold,
                "Evaluated"
            );
            println!(
                "{}\t{}",
                evaluation.status, evaluation.final_exam_threshold
            );
        }
        Commands::Sync {
            spreadsheet_id,
            layout,
            token,
            options,
        } => {
            sync(spreadsheet_id, layout, &token, &options).await?;
        }
        Commands::Local { input, options } => {
            local(&input, &options).await?;
        }
        Commands::Authorize { credentials, token } => {
            authorize(&credentials, &token).await?;
        }
    }

    Ok(())
}

/// Runs one batch against the spreadsheet. Only setup failures (layout,
/// credentials) are returned; batch failures are logged.
#[tracing::instrument(skip(options), fields(strict = options.strict))]
async fn sync(
    spreadsheet_id: Option<String>,
    layout_path: Option<String>,
    token_path: &str,
    options: &EvalOptions,
) -> Result<()> {
    let mut layout = match layout_path {
        Some(path) => SheetLayout::load(&path)?,
        None => SheetLayout::default(),
    };
    if let Some(id) = spreadsheet_id {
        layout.spreadsheet_id = id;
    }
    layout.validate().context("invalid sheet layout")?;

    let http = BasicClient::new()?;
    let access_token = oauth::access_token(&http, Path::new(token_path)).await?;
    let http = Bearer::new(http, &access_token).context("access token is not a valid header value")?;
    let sheets = SheetsClient::new(http, layout);

    let processor = BatchProcessor::new(&sheets, &sheets)
        .with_mode(options.mode())
        .with_labels(options.labels);

    let outcome = processor.run().await;
    summarize(&outcome);

    if let Some(report) = &options.report {
        write_report(report, outcome.records());
    }

    Ok(())
}

/// Evaluates a CSV export and logs the results; nothing is written back.
#[tracing::instrument(skip(options), fields(strict = options.strict))]
async fn local(input: &str, options: &EvalOptions) -> Result<()> {
    let processor = BatchProcessor::new(CsvSource::new(input), DiscardSink)
        .with_mode(options.mode())
        .with_labels(options.labels);

    let outcome = processor.run().await;
    summarize(&outcome);

    if let BatchOutcome::SourceFailed { error } = &outcome {
        anyhow::bail!("reading '{input}': {error}");
    }

    if let Some(report) = &options.report {
        write_report(report, outcome.records());
    }

    Ok(())
}

fn summarize(outcome: &BatchOutcome) {
    match outcome {
        BatchOutcome::NoData => info!("Spreadsheet has no student rows, nothing to do"),
        BatchOutcome::SourceFailed { error } => {
            error!(error = %error, "Batch aborted: could not read the spreadsheet")
        }
        BatchOutcome::Rejected { errors } => {
            warn!(rejected = errors.len(), "Batch aborted: malformed rows")
        }
        BatchOutcome::Completed {
            records,
            statuses,
            thresholds,
        } => {
            let written = [statuses, thresholds]
                .iter()
                .filter(|w| w.is_written())
                .count();
            let cells: u64 = [statuses, thresholds]
                .iter()
                .map(|w| match w {
                    WriteOutcome::Written { updated_cells } => *updated_cells,
                    WriteOutcome::Failed { .. } => 0,
                })
                .sum();
            info!(
                records = records.len(),
                columns_written = written,
                cells_updated = cells,
                "Batch finished"
            );
        }
    }
}

fn write_report(path: &str, records: &[EvaluatedRecord]) {
    if records.is_empty() {
        return;
    }
    match append_report(path, Utc::now(), records) {
        Ok(()) => info!(path, rows = records.len(), "Report appended"),
        Err(e) => error!(path, error = %e, "Failed to write report"),
    }
}

/// Interactive installed-app authorization: prints the consent URL, reads
/// the redirected URL (or bare code) from stdin and saves `token.json`.
#[tracing::instrument]
async fn authorize(credentials_path: &str, token_path: &str) -> Result<()> {
    let secrets = ClientSecrets::load(credentials_path)?;
    let url = oauth::consent_url(&secrets)?;

    eprintln!("Open this URL in a browser and grant access:\n\n{url}\n");
    eprintln!("Then paste the URL you were redirected to (or just the code):");

    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).map(|_| line)
    })
    .await?
    .context("reading authorization code")?;
    let code = oauth::extract_code(&line);
    if code.is_empty() {
        anyhow::bail!("no authorization code entered");
    }

    let http = BasicClient::new()?;
    let (user, _access_token) = oauth::exchange_code(&http, &secrets, &code).await?;
    user.save(token_path)?;

    info!(path = token_path, "Credentials saved");
    Ok(())
}
