//! Spreadsheet layout configuration.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::record::RawRecord;

/// Where the student table lives and which columns hold what.
///
/// Every field has a default matching the course sheet, so a layout file only
/// needs the keys it changes:
/// ```json
/// {
///   "spreadsheet_id": "15usQ_rcPTbwA_usnNvActuLe8hGvztvxjK42v7iXqeI",
///   "sheet_name": "engenharia_de_software"
/// }
/// ```
/// Column indices are zero-based positions within the read range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// First data row (1-based, below the header block).
    pub first_row: u32,
    pub first_column: String,
    pub last_column: String,
    pub name_column: usize,
    pub absences_column: usize,
    pub score_columns: [usize; 3],
    pub status_column: String,
    pub threshold_column: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: "engenharia_de_software".to_string(),
            first_row: 4,
            first_column: "A".to_string(),
            last_column: "H".to_string(),
            name_column: 1,
            absences_column: 2,
            score_columns: [3, 4, 5],
            status_column: "G".to_string(),
            threshold_column: "H".to_string(),
        }
    }
}

impl SheetLayout {
    /// Loads a layout from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading layout '{path}'"))?;
        let layout: Self =
            serde_json::from_str(&content).with_context(|| format!("parsing layout '{path}'"))?;
        Ok(layout)
    }

    /// Checks that the layout can address a real range.
    pub fn validate(&self) -> Result<()> {
        if self.spreadsheet_id.trim().is_empty() {
            bail!("spreadsheet id is not set");
        }
        if self.first_row == 0 {
            bail!("first_row is 1-based and must be at least 1");
        }
        for column in [
            &self.first_column,
            &self.last_column,
            &self.status_column,
            &self.threshold_column,
        ] {
            if column.is_empty() || !column.chars().all(|c| c.is_ascii_uppercase()) {
                bail!("invalid column letter '{column}'");
            }
        }
        Ok(())
    }

    fn quoted_sheet(&self) -> String {
        format!("'{}'", self.sheet_name.replace('\'', "''"))
    }

    /// Open-ended read range, e.g. `'engenharia_de_software'!A4:H`.
    pub fn read_range(&self) -> String {
        format!(
            "{}!{}{}:{}",
            self.quoted_sheet(),
            self.first_column,
            self.first_row,
            self.last_column
        )
    }

    /// Single-column range holding `count` rows, e.g. `'engenharia_de_software'!G4:G13`
    /// for ten records.
    pub fn column_range(&self, column: &str, count: usize) -> String {
        let last_row = self.first_row as usize + count.saturating_sub(1);
        format!(
            "{}!{column}{}:{column}{last_row}",
            self.quoted_sheet(),
            self.first_row
        )
    }

    /// Maps one row of cells to a [`RawRecord`]. Missing trailing cells read
    /// as empty text.
    pub fn record_from_row(&self, row: &[String]) -> RawRecord {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        RawRecord {
            name: row.get(self.name_column).cloned(),
            absences: cell(self.absences_column),
            scores: self.score_columns.map(cell),
        }
    }
}
