//! Local CSV file as a [`RecordSource`], for evaluating an exported sheet
//! without touching the spreadsheet.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::TransportError;
use crate::record::RawRecord;
use crate::services::RecordSource;

const SCORE_HEADERS: [&str; 3] = ["score1", "score2", "score3"];

/// Expected header: `name,absences,score1,score2,score3`, in any order.
///
/// Every column is read as text. Short rows are accepted and read missing
/// trailing cells as empty, the same way sheet rows are.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn read_records(path: &Path) -> Result<Vec<RawRecord>, TransportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let headers = rdr.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h == name);
    let name_col = position("name");
    let absences_col = position("absences");
    let score_cols = SCORE_HEADERS.map(position);

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let cell = |col: Option<usize>| {
            col.and_then(|i| row.get(i))
                .unwrap_or_default()
                .to_string()
        };
        records.push(RawRecord {
            name: name_col.and_then(|i| row.get(i)).map(str::to_string),
            absences: cell(absences_col),
            scores: score_cols.map(cell),
        });
    }

    Ok(records)
}

#[async_trait]
impl RecordSource for CsvSource {
    async fn fetch(&self) -> Result<Vec<RawRecord>, TransportError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_records(&path))
            .await
            .map_err(|e| TransportError::Io(std::io::Error::other(e)))?
    }
}
