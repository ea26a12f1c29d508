//! CSV report of evaluated records.
//!
//! Each batch appends one row per student, stamped with the run time, so a
//! single report file accumulates history across runs.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

use crate::evaluator::Status;
use crate::record::EvaluatedRecord;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    run_at: DateTime<Utc>,
    name: &'a str,
    absences: Option<u32>,
    score1: f64,
    score2: f64,
    score3: f64,
    average: f64,
    status: Status,
    final_exam_threshold: u32,
}

/// Appends `records` to the CSV file at `path`.
///
/// Creates the file with headers if it does not already exist.
pub fn append_report(path: &str, run_at: DateTime<Utc>, records: &[EvaluatedRecord]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = records.len(), "Appending report rows");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    for record in records {
        writer.serialize(ReportRow {
            run_at,
            name: record.name.as_deref().unwrap_or(""),
            absences: record.absences,
            score1: record.scores[0],
            score2: record.scores[1],
            score3: record.scores[2],
            average: record.average,
            status: record.status,
            final_exam_threshold: record.final_exam_threshold,
        })?;
    }
    writer.flush()?;

    Ok(())
}
