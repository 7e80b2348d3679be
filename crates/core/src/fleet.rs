//! Fleet-comparison scoring and ranking.
//!
//! The fleet score weighs quality, utilization, availability and
//! consistency into one 0-100 figure per machine. It is a different
//! formula from the process-quality score in [`crate::aggregate`] and
//! the two are kept as separately named functions on purpose: they
//! answer different questions and must not be unified.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

pub const DEFAULT_QUALITY_WEIGHT: f64 = 0.30;
pub const DEFAULT_UTILIZATION_WEIGHT: f64 = 0.25;
pub const DEFAULT_AVAILABILITY_WEIGHT: f64 = 0.25;
pub const DEFAULT_CONSISTENCY_WEIGHT: f64 = 0.20;

/// Weights of the four fleet-score inputs. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FleetWeights {
    pub quality: f64,
    pub utilization: f64,
    pub availability: f64,
    pub consistency: f64,
}

impl Default for FleetWeights {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY_WEIGHT,
            utilization: DEFAULT_UTILIZATION_WEIGHT,
            availability: DEFAULT_AVAILABILITY_WEIGHT,
            consistency: DEFAULT_CONSISTENCY_WEIGHT,
        }
    }
}

impl FleetWeights {
    /// Validate the weights: each non-negative, together summing to 1.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("quality", self.quality),
            ("utilization", self.utilization),
            ("availability", self.availability),
            ("consistency", self.consistency),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::Validation(format!(
                    "fleet weight {name} must be a non-negative number, got {value}"
                )));
            }
        }
        let sum = self.quality + self.utilization + self.availability + self.consistency;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(CoreError::Validation(format!(
                "fleet weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Fleet-comparison overall performance. All inputs are on a 0-100 scale.
pub fn fleet_performance_score(
    quality_score: f64,
    utilization: f64,
    availability: f64,
    consistency: f64,
    weights: &FleetWeights,
) -> f64 {
    quality_score * weights.quality
        + utilization * weights.utilization
        + availability * weights.availability
        + consistency * weights.consistency
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Score at or above which a group ranks High.
pub const HIGH_SCORE_FLOOR: f64 = 80.0;

/// Score at or above which a group ranks Medium.
pub const MEDIUM_SCORE_FLOOR: f64 = 60.0;

/// Performance band of a ranked group. Boundaries are inclusive at the
/// lower edge: exactly 80 is High, exactly 60 is Medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceCategory {
    High,
    Medium,
    Low,
}

impl PerformanceCategory {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_SCORE_FLOOR {
            Self::High
        } else if score >= MEDIUM_SCORE_FLOOR {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// One entry of a fleet ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    /// 1-based rank; ranks form a permutation of 1..=N.
    pub rank: usize,
    pub category: PerformanceCategory,
    pub score: f64,
    pub entry: T,
}

/// Stable-sort entries by score descending and assign ranks 1..N.
///
/// Ties keep their input order and still receive distinct consecutive
/// ranks — no gaps, no duplicates.
pub fn rank_by_score<T>(entries: Vec<T>, score_fn: impl Fn(&T) -> f64) -> Vec<Ranked<T>> {
    let mut scored: Vec<(f64, T)> = entries
        .into_iter()
        .map(|entry| (score_fn(&entry), entry))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .enumerate()
        .map(|(i, (score, entry))| Ranked {
            rank: i + 1,
            category: PerformanceCategory::from_score(score),
            score,
            entry,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
