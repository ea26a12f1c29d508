//! Fixed grading rules for the course.

/// Thresholds used by the evaluator.
///
/// These are business rules, not user configuration: [`GradingPolicy::default`]
/// is the only policy the binary ever builds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradingPolicy {
    /// Number of sessions in the course.
    pub total_sessions: u32,
    /// Fraction of sessions a student may miss before failing on attendance.
    pub max_absence_ratio: f64,
    /// Composite averages below this fail outright.
    pub failing_average: f64,
    /// Composite averages at or above this pass without a final exam.
    pub passing_average: f64,
    /// Upper bound of a single exam score.
    pub score_scale: f64,
}

impl Default for GradingPolicy {
    fn default() -> Self {
        Self {
            total_sessions: 60,
            max_absence_ratio: 0.25,
            failing_average: 0.5,
            passing_average: 0.7,
            score_scale: 10.0,
        }
    }
}

impl GradingPolicy {
    /// Largest absence count that still counts as attending (15 for the default policy).
    pub fn absence_limit(&self) -> f64 {
        self.max_absence_ratio * self.total_sessions as f64
    }
}
