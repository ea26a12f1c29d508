//! Student records before and after evaluation.

use crate::evaluator::Status;

/// One student row exactly as read from the store.
///
/// Fields stay textual; turning them into numbers is the batch's job so that
/// malformed cells can be handled per [`crate::parser::ParseMode`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub name: Option<String>,
    pub absences: String,
    pub scores: [String; 3],
}

impl RawRecord {
    pub fn new(name: Option<&str>, absences: &str, scores: [&str; 3]) -> Self {
        Self {
            name: name.map(str::to_string),
            absences: absences.to_string(),
            scores: scores.map(str::to_string),
        }
    }

    /// Name for log lines; blank or missing names render as `<unnamed>`.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n,
            _ => "<unnamed>",
        }
    }
}

/// A [`RawRecord`] after parsing and evaluation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedRecord {
    pub name: Option<String>,
    /// `None` when the absences cell held no number.
    pub absences: Option<u32>,
    /// NaN marks a score cell that held no number.
    pub scores: [f64; 3],
    pub average: f64,
    pub status: Status,
    pub final_exam_threshold: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_for_blank_names() {
        assert_eq!(RawRecord::new(Some("Ana"), "0", ["1", "2", "3"]).display_name(), "Ana");
        assert_eq!(RawRecord::new(Some("  "), "0", ["1", "2", "3"]).display_name(), "<unnamed>");
        assert_eq!(RawRecord::new(None, "0", ["1", "2", "3"]).display_name(), "<unnamed>");
    }
}
