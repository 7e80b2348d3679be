//! Correction-trigger tracking.
//!
//! Counts how often the automatic correction system was engaged and how
//! often each actuator fired, per side and per direction.

use serde::{Deserialize, Serialize};

use crate::sample::{CorrectionAction, Side};
use crate::series::SampleSeries;
use crate::stats::percentage;

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// Trigger counts split by direction and side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionBreakdown {
    pub thin_left: usize,
    pub thicken_left: usize,
    pub thin_right: usize,
    pub thicken_right: usize,
}

impl CorrectionBreakdown {
    pub fn total(&self) -> usize {
        self.thin_left + self.thicken_left + self.thin_right + self.thicken_right
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Correction activity over one batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrectionSummary {
    /// Samples with an active left-side trigger.
    pub corrections_left: usize,
    /// Samples with an active right-side trigger.
    pub corrections_right: usize,
    /// Percentage of samples during which automatic correction was on.
    pub uptime_pct: f64,
    /// Percentage of samples with an active trigger on either side.
    pub rate_pct: f64,
    pub breakdown: CorrectionBreakdown,
}

/// Count trigger activity across a series.
pub fn track(series: &SampleSeries) -> CorrectionSummary {
    let total = series.len();
    let mut correcting = 0usize;
    let mut triggered = 0usize;
    let mut breakdown = CorrectionBreakdown::default();

    for sample in series.samples() {
        if sample.is_correcting {
            correcting += 1;
        }
        if sample.has_any_action() {
            triggered += 1;
        }
        match sample.action_on(Side::Left) {
            CorrectionAction::Thin => breakdown.thin_left += 1,
            CorrectionAction::Thicken => breakdown.thicken_left += 1,
            CorrectionAction::None => {}
        }
        match sample.action_on(Side::Right) {
            CorrectionAction::Thin => breakdown.thin_right += 1,
            CorrectionAction::Thicken => breakdown.thicken_right += 1,
            CorrectionAction::None => {}
        }
    }

    CorrectionSummary {
        corrections_left: breakdown.thin_left + breakdown.thicken_left,
        corrections_right: breakdown.thin_right + breakdown.thicken_right,
        uptime_pct: percentage(correcting, total),
        rate_pct: percentage(triggered, total),
        breakdown,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
