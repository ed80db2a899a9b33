use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse bucketing of how far an observation sits from its group mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Map an absolute z-score to its tier. Every boundary is exclusive:
    /// exactly 2.5 is `Medium`, exactly 3.0 is `High`.
    pub fn from_z_score(z_score: f64) -> Self {
        if z_score > 3.0 {
            Severity::Critical
        } else if z_score > 2.5 {
            Severity::High
        } else if z_score > 2.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
