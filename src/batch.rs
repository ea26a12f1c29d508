//! One evaluation pass over the student table.
//!
//! [`BatchProcessor`] fetches rows from a [`RecordSource`], evaluates them in
//! order and hands the status and threshold columns to a [`RecordSink`].
//! Transport failures end up in the returned [`BatchOutcome`]; nothing here
//! returns an error.

use tracing::{error, info, warn};

use crate::error::{ParseError, TransportError};
use crate::evaluator::{Evaluator, StatusLabels};
use crate::parser::{ParseMode, parse_record};
use crate::record::{EvaluatedRecord, RawRecord};
use crate::services::{RecordSink, RecordSource, WriteSummary};

/// Result of one column write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { updated_cells: u64 },
    Failed { error: String },
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written { .. })
    }
}

/// How a batch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// The source had no rows in range; nothing was written.
    NoData,
    /// The source could not be read.
    SourceFailed { error: String },
    /// Strict parsing found malformed rows; nothing was written.
    Rejected { errors: Vec<ParseError> },
    /// Every row was evaluated and both write-backs were attempted.
    Completed {
        records: Vec<EvaluatedRecord>,
        statuses: WriteOutcome,
        thresholds: WriteOutcome,
    },
}

impl BatchOutcome {
    pub fn records(&self) -> &[EvaluatedRecord] {
        match self {
            BatchOutcome::Completed { records, .. } => records,
            _ => &[],
        }
    }
}

/// Parses and evaluates `rows`, preserving their order.
///
/// # Errors
///
/// In [`ParseMode::Strict`], every malformed row, in order. Lenient parsing
/// never fails.
pub fn evaluate_rows(
    evaluator: &Evaluator,
    rows: &[RawRecord],
    mode: ParseMode,
) -> Result<Vec<EvaluatedRecord>, Vec<ParseError>> {
    let max_score = evaluator.policy().score_scale;
    let mut records = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();

    for (index, raw) in rows.iter().enumerate() {
        let fields = match parse_record(index, raw, mode, max_score) {
            Ok(fields) => fields,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };

        let [s1, s2, s3] = fields.scores;
        // Missing absences can never exceed the limit.
        let evaluation = evaluator.evaluate(fields.absences.unwrap_or(0), s1, s2, s3);

        records.push(EvaluatedRecord {
            name: raw.name.clone(),
            absences: fields.absences,
            scores: fields.scores,
            average: evaluation.average,
            status: evaluation.status,
            final_exam_threshold: evaluation.final_exam_threshold,
        });
    }

    if errors.is_empty() {
        Ok(records)
    } else {
        Err(errors)
    }
}

/// Runs evaluation passes against an injected source and sink.
pub struct BatchProcessor<S, K> {
    source: S,
    sink: K,
    evaluator: Evaluator,
    mode: ParseMode,
    labels: StatusLabels,
}

impl<S: RecordSource, K: RecordSink> BatchProcessor<S, K> {
    pub fn new(source: S, sink: K) -> Self {
        Self {
            source,
            sink,
            evaluator: Evaluator::default(),
            mode: ParseMode::default(),
            labels: StatusLabels::default(),
        }
    }

    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_labels(mut self, labels: StatusLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Fetches rows from the source and processes them.
    #[tracing::instrument(skip(self), fields(mode = ?self.mode))]
    pub async fn run(&self) -> BatchOutcome {
        match self.source.fetch().await {
            Ok(rows) => self.process(rows).await,
            Err(e) => {
                error!(error = %e, "Failed to read student rows");
                BatchOutcome::SourceFailed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Evaluates `rows` in order and writes both result columns.
    ///
    /// The two writes are issued together and both are awaited, so a failed
    /// status write never prevents the threshold write.
    pub async fn process(&self, rows: Vec<RawRecord>) -> BatchOutcome {
        if rows.is_empty() {
            info!("No data found");
            return BatchOutcome::NoData;
        }

        let records = match evaluate_rows(&self.evaluator, &rows, self.mode) {
            Ok(records) => records,
            Err(errors) => {
                for e in &errors {
                    error!(error = %e, "Malformed record");
                }
                warn!(
                    rejected = errors.len(),
                    total = rows.len(),
                    "Batch rejected, nothing written"
                );
                return BatchOutcome::Rejected { errors };
            }
        };

        for (raw, record) in rows.iter().zip(&records) {
            let name = raw.display_name();
            if record.average.is_nan() {
                warn!(name, "Score missing or not numeric, average is NaN");
            }
            if record.final_exam_threshold > 0 {
                info!(
                    name,
                    threshold = record.final_exam_threshold,
                    "Final exam score needed"
                );
            }
            info!(name, status = %record.status, "Evaluated");
        }

        let statuses: Vec<String> = records
            .iter()
            .map(|r| self.labels.label(r.status).to_string())
            .collect();
        let thresholds: Vec<u32> = records.iter().map(|r| r.final_exam_threshold).collect();

        let (status_result, threshold_result) = tokio::join!(
            self.sink.write_statuses(&statuses),
            self.sink.write_thresholds(&thresholds),
        );

        let statuses = report_write("status", status_result);
        let thresholds = report_write("threshold", threshold_result);

        BatchOutcome::Completed {
            records,
            statuses,
            thresholds,
        }
    }
}

fn report_write(column: &str, result: Result<WriteSummary, TransportError>) -> WriteOutcome {
    match result {
        Ok(summary) => {
            info!(column, updated_cells = summary.updated_cells, "Cells updated");
            WriteOutcome::Written {
                updated_cells: summary.updated_cells,
            }
        }
        Err(e) => {
            error!(column, error = %e, "Failed to update spreadsheet");
            WriteOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}
