//! Fixed-threshold evaluation of batch metrics.
//!
//! Four independent dimensions are labelled per batch: balance, MAE,
//! SSD and correction mode. Only MAE gates the batch pass/fail status;
//! the other three are informative. Thresholds always come in from
//! configuration, never as literals inside the classification body.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Default thresholds
// ---------------------------------------------------------------------------

/// Maximum |left-right| average difference still considered balanced, mm.
pub const DEFAULT_BALANCE_THRESHOLD_MM: f64 = 1.0;

/// Maximum MAE still considered within standard, mm.
pub const DEFAULT_MAE_THRESHOLD_MM: f64 = 1.0;

/// Maximum SSD still considered consistent.
pub const DEFAULT_SSD_THRESHOLD: f64 = 1.0;

/// Correction uptime (strictly) above which a batch ran in auto mode, %.
pub const DEFAULT_AUTO_UPTIME_THRESHOLD_PCT: f64 = 50.0;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Evaluation thresholds, externally supplied configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationThresholds {
    pub balance_mm: f64,
    pub mae_mm: f64,
    pub ssd: f64,
    pub auto_uptime_pct: f64,
}

impl Default for EvaluationThresholds {
    fn default() -> Self {
        Self {
            balance_mm: DEFAULT_BALANCE_THRESHOLD_MM,
            mae_mm: DEFAULT_MAE_THRESHOLD_MM,
            ssd: DEFAULT_SSD_THRESHOLD,
            auto_uptime_pct: DEFAULT_AUTO_UPTIME_THRESHOLD_PCT,
        }
    }
}

impl EvaluationThresholds {
    /// Validate the thresholds. A negative or non-finite threshold is a
    /// configuration error and fatal at load time.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("balance_mm", self.balance_mm),
            ("mae_mm", self.mae_mm),
            ("ssd", self.ssd),
            ("auto_uptime_pct", self.auto_uptime_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::Validation(format!(
                    "threshold {name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Per-dimension evaluation
// ---------------------------------------------------------------------------

/// Outcome of one evaluation dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub status: &'static str,
    pub is_good: bool,
}

/// Balance: good iff `|t_balance| <= balance_mm` (boundary inclusive).
pub fn evaluate_balance(t_balance: f64, thresholds: &EvaluationThresholds) -> Evaluation {
    if t_balance.abs() <= thresholds.balance_mm {
        Evaluation {
            status: "balanced",
            is_good: true,
        }
    } else {
        Evaluation {
            status: "unbalanced",
            is_good: false,
        }
    }
}

/// MAE: good iff `t_mae <= mae_mm` (boundary inclusive).
pub fn evaluate_mae(t_mae: f64, thresholds: &EvaluationThresholds) -> Evaluation {
    if t_mae <= thresholds.mae_mm {
        Evaluation {
            status: "in spec",
            is_good: true,
        }
    } else {
        Evaluation {
            status: "out of spec",
            is_good: false,
        }
    }
}

/// SSD: good iff `t_ssd <= ssd` (boundary inclusive).
pub fn evaluate_ssd(t_ssd: f64, thresholds: &EvaluationThresholds) -> Evaluation {
    if t_ssd <= thresholds.ssd {
        Evaluation {
            status: "consistent",
            is_good: true,
        }
    } else {
        Evaluation {
            status: "fluctuating",
            is_good: false,
        }
    }
}

/// Correction: good iff `correction_uptime > auto_uptime_pct` (strict).
pub fn evaluate_correction(uptime_pct: f64, thresholds: &EvaluationThresholds) -> Evaluation {
    if uptime_pct > thresholds.auto_uptime_pct {
        Evaluation {
            status: "auto",
            is_good: true,
        }
    } else {
        Evaluation {
            status: "manual",
            is_good: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Gating quality status
// ---------------------------------------------------------------------------

/// Batch pass/fail label. Gates on MAE alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Pass,
    Fail,
}

impl QualityStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

/// Pass iff `t_mae <= mae_mm`; the other dimensions never gate.
pub fn quality_status(t_mae: f64, thresholds: &EvaluationThresholds) -> QualityStatus {
    if t_mae <= thresholds.mae_mm {
        QualityStatus::Pass
    } else {
        QualityStatus::Fail
    }
}

// ---------------------------------------------------------------------------
// All four dimensions
// ---------------------------------------------------------------------------

/// All four evaluation dimensions of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchEvaluations {
    pub balance: Evaluation,
    pub mae: Evaluation,
    pub ssd: Evaluation,
    pub correction: Evaluation,
}

impl BatchEvaluations {
    pub fn good_count(&self) -> usize {
        [self.balance, self.mae, self.ssd, self.correction]
            .iter()
            .filter(|e| e.is_good)
            .count()
    }

    /// Good on every dimension at once.
    pub fn all_good(&self) -> bool {
        self.good_count() == 4
    }
}

// ---------------------------------------------------------------------------
// Batch score
// ---------------------------------------------------------------------------

/// Share of good dimensions, with a letter grade for the listing pages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchScore {
    pub good_count: usize,
    pub total_count: usize,
    pub percentage: f64,
    pub grade: char,
}

/// Score a batch from its four evaluations.
pub fn batch_score(evaluations: &BatchEvaluations) -> BatchScore {
    let good_count = evaluations.good_count();
    let total_count = 4;
    let percentage = good_count as f64 / total_count as f64 * 100.0;
    BatchScore {
        good_count,
        total_count,
        percentage,
        grade: grade_from_percentage(percentage),
    }
}

fn grade_from_percentage(percentage: f64) -> char {
    if percentage >= 90.0 {
        'A'
    } else if percentage >= 80.0 {
        'B'
    } else if percentage >= 70.0 {
        'C'
    } else if percentage >= 60.0 {
        'D'
    } else {
        'F'
    }
}

// ---------------------------------------------------------------------------
// Recipe-vs-actual standard deviation check
// ---------------------------------------------------------------------------

/// Deviation percentage at or below which the standards agree.
pub const DEVIATION_OK_PCT: f64 = 5.0;

/// Deviation percentage at or below which the mismatch is a warning.
pub const DEVIATION_WARNING_PCT: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationSeverity {
    Ok,
    Warning,
    Critical,
}

impl DeviationSeverity {
    pub fn from_percent(deviation_pct: f64) -> Self {
        let abs = deviation_pct.abs();
        if abs <= DEVIATION_OK_PCT {
            Self::Ok
        } else if abs <= DEVIATION_WARNING_PCT {
            Self::Warning
        } else {
            Self::Critical
        }
    }
}

/// Mismatch between the recipe's standard midpoint and the midpoint the
/// machine actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StandardDeviationCheck {
    pub deviation_mm: f64,
    pub deviation_pct: f64,
    pub severity: DeviationSeverity,
}

/// Compare the recipe standard midpoint with the one the machine ran.
pub fn check_standard_deviation(recipe_std_mid: f64, actual_std_mid: f64) -> StandardDeviationCheck {
    let deviation_mm = actual_std_mid - recipe_std_mid;
    let deviation_pct = if recipe_std_mid > 0.0 {
        deviation_mm / recipe_std_mid * 100.0
    } else {
        0.0
    };
    StandardDeviationCheck {
        deviation_mm,
        deviation_pct,
        severity: DeviationSeverity::from_percent(deviation_pct),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
