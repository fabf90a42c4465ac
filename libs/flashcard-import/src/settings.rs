//! Import policy configuration.

use serde::{Deserialize, Serialize};

/// Tunable policy for field ranking and default selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Share of notes a field must be populated in to count as useful.
    pub min_coverage_ratio: f64,
    /// Cap on fields pre-selected for the caller. `None` selects every useful field.
    pub max_default_selected: Option<usize>,
    /// Characters kept in `FieldStat::sample_text`.
    pub sample_length: usize,
    /// Collection name used when no source file name is known.
    pub default_name: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            min_coverage_ratio: 0.1,
            max_default_selected: Some(10),
            sample_length: 100,
            default_name: "Imported Deck".to_string(),
        }
    }
}

impl ImportSettings {
    /// Clamp out-of-range values.
    pub fn validated(mut self) -> Self {
        self.min_coverage_ratio = if self.min_coverage_ratio.is_finite() {
            self.min_coverage_ratio.clamp(0.0, 1.0)
        } else {
            Self::default().min_coverage_ratio
        };
        self.sample_length = self.sample_length.max(1);
        self
    }

    /// Minimum populated count for a field to be useful among `total_notes`.
    pub fn usefulness_threshold(&self, total_notes: usize) -> usize {
        let scaled = (total_notes as f64 * self.min_coverage_ratio).floor() as usize;
        scaled.max(1)
    }
}
