//! Error types shared by the record sources, sinks and the batch processor.

use thiserror::Error;

/// Failure talking to the tabular store (spreadsheet API or local file).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Which input field of a record failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Absences,
    Score(usize),
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Absences => f.write_str("absences"),
            Field::Score(n) => write!(f, "score{n}"),
        }
    }
}

/// A malformed field found while parsing in strict mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record {index} ({name}): invalid {field} value {value:?}")]
pub struct ParseError {
    /// Zero-based position of the record in the batch.
    pub index: usize,
    pub name: String,
    pub field: Field,
    pub value: String,
}
