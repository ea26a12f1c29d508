//! Per-student pass/fail evaluation.

use serde::Serialize;
use std::fmt;

use crate::policy::GradingPolicy;

/// Outcome class of a single student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    #[serde(rename = "Failed-Absence")]
    FailedAbsence,
    #[serde(rename = "Failed-Grade")]
    FailedGrade,
    FinalExam,
    Passed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::FailedAbsence => "Failed-Absence",
            Status::FailedGrade => "Failed-Grade",
            Status::FinalExam => "FinalExam",
            Status::Passed => "Passed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text written to the status column.
///
/// `Portuguese` reproduces the labels the course sheet has always used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StatusLabels {
    #[default]
    English,
    Portuguese,
}

impl StatusLabels {
    pub fn label(&self, status: Status) -> &'static str {
        match self {
            StatusLabels::English => status.as_str(),
            StatusLabels::Portuguese => match status {
                Status::FailedAbsence => "Reprovado por Falta",
                Status::FailedGrade => "Reprovado por Nota",
                Status::FinalExam => "Exame Final",
                Status::Passed => "Aprovado",
            },
        }
    }
}

/// Result of [`Evaluator::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    /// Composite average on a 0–1 scale. NaN when any score is NaN.
    pub average: f64,
    pub status: Status,
    /// Minimum final-exam score; zero unless `status` is [`Status::FinalExam`].
    pub final_exam_threshold: u32,
}

/// Applies a [`GradingPolicy`] to one student's attendance and scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    policy: GradingPolicy,
}

impl Evaluator {
    pub fn new(policy: GradingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &GradingPolicy {
        &self.policy
    }

    /// Mean of the three scores, rescaled from `0..=score_scale` to `0..=1`.
    pub fn composite_average(&self, score1: f64, score2: f64, score3: f64) -> f64 {
        ((score1 + score2 + score3) / 3.0) / self.policy.score_scale
    }

    /// Classifies a student.
    ///
    /// | Condition                         | Status          | Threshold            |
    /// |-----------------------------------|-----------------|----------------------|
    /// | absences > 15                     | Failed-Absence  | 0                    |
    /// | average < 0.5                     | Failed-Grade    | 0                    |
    /// | 0.5 <= average < 0.7              | FinalExam       | ceil(10 - avg * 10)  |
    /// | otherwise                         | Passed          | 0                    |
    ///
    /// Attendance is checked first. A NaN average fails every comparison and
    /// therefore lands on `Passed`; callers that care must reject NaN input
    /// before getting here (see [`crate::parser::ParseMode::Strict`]).
    pub fn evaluate(&self, absences: u32, score1: f64, score2: f64, score3: f64) -> Evaluation {
        let average = self.composite_average(score1, score2, score3);

        if absences as f64 > self.policy.absence_limit() {
            return Evaluation {
                average,
                status: Status::FailedAbsence,
                final_exam_threshold: 0,
            };
        }

        let (status, final_exam_threshold) = match average {
            a if a < self.policy.failing_average => (Status::FailedGrade, 0),
            a if a < self.policy.passing_average => {
                let scale = self.policy.score_scale;
                (Status::FinalExam, (scale - a * scale).ceil() as u32)
            }
            _ => (Status::Passed, 0),
        };

        Evaluation {
            average,
            status,
            final_exam_threshold,
        }
    }
}

/// Evaluates with the default policy.
pub fn evaluate(absences: u32, score1: f64, score2: f64, score3: f64) -> Evaluation {
    Evaluator::default().evaluate(absences, score1, score2, score3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_scores_pass() {
        let e = evaluate(0, 10.0, 10.0, 10.0);
        assert_eq!(e.average, 1.0);
        assert_eq!(e.status, Status::Passed);
        assert_eq!(e.final_exam_threshold, 0);
    }

    #[test]
    fn test_absence_checked_before_grade() {
        let e = evaluate(20, 0.0, 0.0, 0.0);
        assert_eq!(e.status, Status::FailedAbsence);
        assert_eq!(e.final_exam_threshold, 0);

        let e = evaluate(20, 10.0, 10.0, 10.0);
        assert_eq!(e.status, Status::FailedAbsence);
    }

    #[test]
    fn test_final_exam_threshold() {
        let e = evaluate(0, 6.0, 6.0, 6.0);
        assert!((e.average - 0.6).abs() < 1e-12);
        assert_eq!(e.status, Status::FinalExam);
        assert_eq!(e.final_exam_threshold, 4);
    }

    #[test]
    fn test_absence_boundary() {
        assert_eq!(evaluate(15, 8.0, 8.0, 8.0).status, Status::Passed);
        assert_eq!(evaluate(16, 8.0, 8.0, 8.0).status, Status::FailedAbsence);
    }

    #[test]
    fn test_average_boundaries() {
        let at_half = evaluate(0, 5.0, 5.0, 5.0);
        assert_eq!(at_half.status, Status::FinalExam);
        assert_eq!(at_half.final_exam_threshold, 5);

        let at_pass = evaluate(0, 7.0, 7.0, 7.0);
        assert_eq!(at_pass.status, Status::Passed);
        assert_eq!(at_pass.final_exam_threshold, 0);

        assert_eq!(evaluate(0, 4.9, 5.0, 5.0).status, Status::FailedGrade);
        assert_eq!(evaluate(0, 6.9, 7.0, 7.0).status, Status::FinalExam);
    }

    #[test]
    fn test_failed_grade_has_zero_threshold() {
        let e = evaluate(3, 2.0, 4.0, 3.0);
        assert_eq!(e.status, Status::FailedGrade);
        assert_eq!(e.final_exam_threshold, 0);
    }

    #[test]
    fn test_final_exam_band_thresholds_stay_in_range() {
        // Sweep every score total that lands in the band, in tenths.
        for tenths in 150..=300 {
            let total = tenths as f64 / 10.0;
            let e = evaluate(0, total, 0.0, 0.0);
            if e.status == Status::FinalExam {
                assert!(
                    (3..=5).contains(&e.final_exam_threshold),
                    "total {total} gave threshold {}",
                    e.final_exam_threshold
                );
            } else {
                assert_eq!(e.final_exam_threshold, 0);
            }
        }
    }

    #[test]
    fn test_threshold_nonzero_only_for_final_exam() {
        for absences in [0, 15, 16, 40] {
            for score in [0.0, 3.3, 5.0, 6.2, 6.99, 7.0, 9.5] {
                let e = evaluate(absences, score, score, score);
                assert_eq!(e.final_exam_threshold != 0, e.status == Status::FinalExam);
            }
        }
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        assert_eq!(evaluate(4, 5.5, 6.5, 7.5), evaluate(4, 5.5, 6.5, 7.5));
    }

    #[test]
    fn test_nan_score_falls_through_to_passed() {
        let e = evaluate(0, f64::NAN, 2.0, 2.0);
        assert!(e.average.is_nan());
        assert_eq!(e.status, Status::Passed);
        assert_eq!(e.final_exam_threshold, 0);
    }

    #[test]
    fn test_nan_does_not_mask_absence_failure() {
        assert_eq!(evaluate(30, f64::NAN, 2.0, 2.0).status, Status::FailedAbsence);
    }

    #[test]
    fn test_labels() {
        assert_eq!(StatusLabels::English.label(Status::FailedAbsence), "Failed-Absence");
        assert_eq!(StatusLabels::English.label(Status::FinalExam), "FinalExam");
        assert_eq!(StatusLabels::Portuguese.label(Status::FailedGrade), "Reprovado por Nota");
        assert_eq!(StatusLabels::Portuguese.label(Status::Passed), "Aprovado");
        assert_eq!(Status::FailedGrade.to_string(), "Failed-Grade");
    }
}
