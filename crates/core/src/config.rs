//! Analytics configuration loaded from environment variables.
//!
//! All fields have the plant's established defaults. Configuration
//! errors are fatal at load time — unlike per-record decode errors,
//! which are always recovered locally.

use serde::{Deserialize, Serialize};

use crate::effectiveness::LookaheadWindow;
use crate::error::CoreError;
use crate::evaluation::EvaluationThresholds;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Minimum decoded samples for a batch to count as fully measured.
/// Matches the capture daemon's minimum-measurements rule. Batches below
/// the floor are flagged, not dropped.
pub const DEFAULT_MIN_SAMPLES: usize = 10;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Everything tunable about the analytics engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub thresholds: EvaluationThresholds,
    pub lookahead: LookaheadWindow,
    pub min_samples: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            thresholds: EvaluationThresholds::default(),
            lookahead: LookaheadWindow::default(),
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

impl AnalyticsConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default |
    /// |--------------------------------|---------|
    /// | `CALIPER_BALANCE_THRESHOLD_MM` | `1.0`   |
    /// | `CALIPER_MAE_THRESHOLD_MM`     | `1.0`   |
    /// | `CALIPER_SSD_THRESHOLD`        | `1.0`   |
    /// | `CALIPER_AUTO_UPTIME_PCT`      | `50`    |
    /// | `CALIPER_LOOKAHEAD_MIN`        | `3`     |
    /// | `CALIPER_LOOKAHEAD_FORCE`      | `5`     |
    /// | `CALIPER_LOOKAHEAD_MAX`        | `8`     |
    /// | `CALIPER_MIN_SAMPLES`          | `10`    |
    pub fn from_env() -> Result<Self, CoreError> {
        let defaults = Self::default();
        let config = Self {
            thresholds: EvaluationThresholds {
                balance_mm: env_f64(
                    "CALIPER_BALANCE_THRESHOLD_MM",
                    defaults.thresholds.balance_mm,
                )?,
                mae_mm: env_f64("CALIPER_MAE_THRESHOLD_MM", defaults.thresholds.mae_mm)?,
                ssd: env_f64("CALIPER_SSD_THRESHOLD", defaults.thresholds.ssd)?,
                auto_uptime_pct: env_f64(
                    "CALIPER_AUTO_UPTIME_PCT",
                    defaults.thresholds.auto_uptime_pct,
                )?,
            },
            lookahead: LookaheadWindow {
                min_offset: env_usize("CALIPER_LOOKAHEAD_MIN", defaults.lookahead.min_offset)?,
                force_offset: env_usize(
                    "CALIPER_LOOKAHEAD_FORCE",
                    defaults.lookahead.force_offset,
                )?,
                max_offset: env_usize("CALIPER_LOOKAHEAD_MAX", defaults.lookahead.max_offset)?,
            },
            min_samples: env_usize("CALIPER_MIN_SAMPLES", defaults.min_samples)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every tunable; any failure is fatal.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.thresholds.validate()?;
        self.lookahead.validate()?;
        if self.min_samples == 0 {
            return Err(CoreError::Validation(
                "min_samples must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_f64(name: &str, default: f64) -> Result<f64, CoreError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation(format!("{name} must be a number, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}

fn env_usize(name: &str, default: usize) -> Result<usize, CoreError> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            CoreError::Validation(format!("{name} must be a non-negative integer, got '{raw}'"))
        }),
        Err(_) => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
