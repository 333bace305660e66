//! Coverage threshold condition

use regex::Regex;

/// Minimum coverage a release must reach to be deployed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageThreshold {
    pub minimum: f64,
}

impl CoverageThreshold {
    pub fn new(minimum: f64) -> Self {
        Self { minimum }
    }

    /// Inclusive: coverage equal to the minimum passes
    pub fn is_met(&self, coverage: f64) -> bool {
        coverage >= self.minimum
    }
}

/// Extract the first decimal number from a coverage tool's output
///
/// `coverage report --format=total` prints a bare `87` or `87.5`, while the
/// plain report ends with a `TOTAL ... 87%` line; both are handled.
pub fn parse_coverage(output: &str) -> Option<f64> {
    let number = Regex::new(r"\d+(?:\.\d+)?").ok()?;
    number
        .find(output)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
