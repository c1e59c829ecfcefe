// Error types and non-fatal run conditions

use serde::Serialize;
use thiserror::Error;

/// Fatal failures of a single pipeline run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid field '{path}': {reason}")]
    InvalidField { path: String, reason: String },

    #[error("Ratio is undefined: no records to divide by")]
    DivisionByZero,
}

pub type ChartResult<T> = std::result::Result<T, ChartError>;

impl ChartError {
    pub fn invalid_field(path: impl ToString, reason: impl Into<String>) -> Self {
        ChartError::InvalidField {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Non-fatal conditions signaled alongside a run's (possibly degenerate) result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum Condition {
    /// Empty or zero-variance domain, resolved by the midpoint / zero-rect fallback.
    DegenerateDomain { scale: String },
    /// Geo points that could not be projected and were left out of the markers.
    ProjectionFailure { dropped: usize },
    /// Ratio requested over zero records.
    DivisionByZero,
    /// Records excluded because a field was missing.
    SkippedRecords { field: String, count: usize },
    /// Records kept under the placeholder category because their label was missing.
    MissingLabels { field: String, count: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    conditions: Vec<Condition>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, condition: Condition) {
        log::warn!("{:?}", condition);
        self.conditions.push(condition);
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn has_degenerate_domain(&self, scale: &str) -> bool {
        self.conditions
            .iter()
            .any(|c| matches!(c, Condition::DegenerateDomain { scale: s } if s == scale))
    }

    pub fn has_division_by_zero(&self) -> bool {
        self.conditions.iter().any(|c| matches!(c, Condition::DivisionByZero))
    }

    /// Total number of geo points dropped by the projection.
    pub fn projection_failures(&self) -> usize {
        self.conditions
            .iter()
            .map(|c| match c {
                Condition::ProjectionFailure { dropped } => *dropped,
                _ => 0,
            })
            .sum()
    }

    /// Total number of records drawn under the placeholder category.
    pub fn missing_labels(&self) -> usize {
        self.conditions
            .iter()
            .map(|c| match c {
                Condition::MissingLabels { count, .. } => *count,
                _ => 0,
            })
            .sum()
    }

    /// Total number of records skipped for a missing field.
    pub fn skipped_records(&self) -> usize {
        self.conditions
            .iter()
            .map(|c| match c {
                Condition::SkippedRecords { count, .. } => *count,
                _ => 0,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ChartError::invalid_field("a.b", "expected a string");
        assert_eq!(err.to_string(), "Invalid field 'a.b': expected a string");
        assert!(ChartError::DivisionByZero.to_string().contains("undefined"));
    }

    #[test]
    fn test_diagnostics_totals() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Condition::ProjectionFailure { dropped: 2 });
        diagnostics.push(Condition::SkippedRecords { field: "x".to_string(), count: 3 });
        diagnostics.push(Condition::DegenerateDomain { scale: "y".to_string() });
        diagnostics.push(Condition::MissingLabels { field: "z".to_string(), count: 1 });

        assert_eq!(diagnostics.projection_failures(), 2);
        assert_eq!(diagnostics.skipped_records(), 3);
        assert_eq!(diagnostics.missing_labels(), 1);
        assert!(diagnostics.has_degenerate_domain("y"));
        assert!(!diagnostics.has_degenerate_domain("x"));
        assert!(!diagnostics.has_division_by_zero());
    }
}
