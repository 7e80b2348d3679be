//! Correction effectiveness via bounded forward look-ahead.
//!
//! A correction is not instantaneous: the first couple of ticks after a
//! trigger still show the mechanical transient. The estimator therefore
//! skips ahead before reading the settled thickness, and it stops at the
//! first tick with no further action on the same side so a later,
//! unrelated trigger is not attributed to the current one. Overlapping
//! triggers remain an accepted approximation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::sample::{CorrectionAction, Side};
use crate::series::SampleSeries;

// ---------------------------------------------------------------------------
// Window defaults
// ---------------------------------------------------------------------------

/// First forward offset considered as a settle candidate.
pub const DEFAULT_MIN_OFFSET: usize = 3;

/// Offset at which the reading is taken unconditionally when no
/// settled (action-free) tick was found earlier.
pub const DEFAULT_FORCE_OFFSET: usize = 5;

/// Last forward offset the scan will look at.
pub const DEFAULT_MAX_OFFSET: usize = 8;

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// Bounds of the forward scan. The defaults are the empirically tuned
/// values the plant has been running with; they are parameters rather
/// than literals so they can be re-tuned without touching the algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookaheadWindow {
    pub min_offset: usize,
    pub force_offset: usize,
    pub max_offset: usize,
}

impl Default for LookaheadWindow {
    fn default() -> Self {
        Self {
            min_offset: DEFAULT_MIN_OFFSET,
            force_offset: DEFAULT_FORCE_OFFSET,
            max_offset: DEFAULT_MAX_OFFSET,
        }
    }
}

impl LookaheadWindow {
    /// Validate the bounds: `1 <= min <= force <= max`.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.min_offset < 1 {
            return Err(CoreError::Validation(
                "lookahead min_offset must be at least 1".to_string(),
            ));
        }
        if self.min_offset > self.force_offset {
            return Err(CoreError::Validation(format!(
                "lookahead min_offset ({}) must not exceed force_offset ({})",
                self.min_offset, self.force_offset
            )));
        }
        if self.force_offset > self.max_offset {
            return Err(CoreError::Validation(format!(
                "lookahead force_offset ({}) must not exceed max_offset ({})",
                self.force_offset, self.max_offset
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Trigger effect
// ---------------------------------------------------------------------------

/// Measured thickness change attributed to one correction trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TriggerEffect {
    /// Index of the trigger sample within the series.
    pub sample_index: usize,
    pub side: Side,
    pub action: CorrectionAction,
    /// Thickness at the trigger tick, mm.
    pub baseline: f64,
    /// Thickness at the settled tick, mm.
    pub settled: f64,
    /// Forward offset the settled reading was taken from.
    pub settled_offset: usize,
    /// `|settled - baseline|`, mm.
    pub change_mm: f64,
    /// Change as a percentage of the settled value; 0 when settled is 0.
    pub change_pct: f64,
}

/// Estimate the effect of the trigger at `index` on `side`.
///
/// Returns `None` when the sample has no active action on that side, or
/// when the series ends before any usable settle candidate — such
/// triggers are excluded from effectiveness statistics rather than
/// recorded as zero change.
pub fn analyze_trigger(
    series: &SampleSeries,
    index: usize,
    side: Side,
    window: &LookaheadWindow,
) -> Option<TriggerEffect> {
    let samples = series.samples();
    let trigger = samples.get(index)?;
    let action = trigger.action_on(side);
    if !action.is_active() {
        return None;
    }

    let baseline = trigger.sensor_on(side);
    let remaining = samples.len() - 1 - index;
    let last_offset = window.max_offset.min(remaining);

    let mut settled: Option<(usize, f64)> = None;
    for offset in window.min_offset..=last_offset {
        let candidate = &samples[index + offset];
        if !candidate.action_on(side).is_active() || offset >= window.force_offset {
            settled = Some((offset, candidate.sensor_on(side)));
            break;
        }
    }

    let (settled_offset, settled) = settled?;
    let change_mm = (settled - baseline).abs();
    let change_pct = if settled == 0.0 {
        0.0
    } else {
        change_mm / settled * 100.0
    };

    Some(TriggerEffect {
        sample_index: index,
        side,
        action,
        baseline,
        settled,
        settled_offset,
        change_mm,
        change_pct,
    })
}

/// Estimate every measurable trigger in a series, both sides.
pub fn analyze_series(series: &SampleSeries, window: &LookaheadWindow) -> Vec<TriggerEffect> {
    let mut effects = Vec::new();
    for index in 0..series.len() {
        for side in Side::BOTH {
            if let Some(effect) = analyze_trigger(series, index, side, window) {
                effects.push(effect);
            }
        }
    }
    effects
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;
    use crate::series::SampleSeries;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    /// Build a series from left-side readings and left action codes.
    fn left_series(readings: &[f64], actions: &[u8]) -> SampleSeries {
        assert_eq!(readings.len(), actions.len());
        let base = NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let samples = readings
            .iter()
            .zip(actions)
            .enumerate()
            .map(|(i, (&value, &action))| Sample {
                taken_at: base + chrono::Duration::seconds(i as i64),
                is_correcting: action != 0,
                action_left: CorrectionAction::from_code(action as i64).unwrap(),
                action_right: CorrectionAction::None,
                sensor_left: value,
                sensor_right: value,
                recipe_id: None,
                std_min: None,
                std_max: None,
                std_mid: Some(3.0),
            })
            .collect();
        SampleSeries::new(samples).unwrap()
    }

    // -- window validation ----------------------------------------------------

    #[test]
    fn default_window_is_valid() {
        assert!(LookaheadWindow::default().validate().is_ok());
    }

    #[test]
    fn window_rejects_min_above_force() {
        let window = LookaheadWindow {
            min_offset: 6,
            force_offset: 5,
            max_offset: 8,
        };
        assert_matches!(window.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn window_rejects_force_above_max() {
        let window = LookaheadWindow {
            min_offset: 3,
            force_offset: 9,
            max_offset: 8,
        };
        assert_matches!(window.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn window_rejects_zero_min() {
        let window = LookaheadWindow {
            min_offset: 0,
            force_offset: 5,
            max_offset: 8,
        };
        assert_matches!(window.validate(), Err(CoreError::Validation(_)));
    }

    // -- analyze_trigger ------------------------------------------------------

    #[test]
    fn thin_trigger_settles_at_first_free_candidate() {
        // Thin trigger at index 3, baseline 2.0; offset 3 lands on index 6
        // where no action is active and the sheet reads 3.0.
        let readings = [3.0, 3.0, 3.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 3.0];
        let actions = [0, 0, 0, 1, 0, 0, 0, 0, 0, 0];
        let series = left_series(&readings, &actions);

        let effect =
            analyze_trigger(&series, 3, Side::Left, &LookaheadWindow::default()).unwrap();
        assert_eq!(effect.settled_offset, 3);
        assert_eq!(effect.baseline, 2.0);
        assert_eq!(effect.settled, 3.0);
        assert!((effect.change_mm - 1.0).abs() < 1e-12);
        assert!((effect.change_pct - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn busy_window_forces_settle_at_exactly_force_offset() {
        // Actions continue through the whole window: the reading must be
        // taken from offset 5, not 4 or 6.
        let readings = [2.0, 2.1, 2.2, 2.3, 2.4, 2.5, 2.6, 2.7, 2.8, 2.9];
        let actions = [1, 1, 1, 1, 1, 1, 1, 1, 1, 1];
        let series = left_series(&readings, &actions);

        let effect =
            analyze_trigger(&series, 0, Side::Left, &LookaheadWindow::default()).unwrap();
        assert_eq!(effect.settled_offset, 5);
        assert_eq!(effect.settled, 2.5);
    }

    #[test]
    fn transient_offsets_are_skipped() {
        // An action-free tick at offset 2 must not be used; the first
        // candidate is offset 3.
        let readings = [2.0, 9.0, 9.0, 2.6, 3.0, 3.0];
        let actions = [1, 0, 0, 0, 0, 0];
        let series = left_series(&readings, &actions);

        let effect =
            analyze_trigger(&series, 0, Side::Left, &LookaheadWindow::default()).unwrap();
        assert_eq!(effect.settled_offset, 3);
        assert_eq!(effect.settled, 2.6);
    }

    #[test]
    fn short_series_yields_none_not_zero() {
        // Only two samples after the trigger: no candidate offset exists.
        let readings = [2.0, 2.1, 2.2];
        let actions = [1, 0, 0];
        let series = left_series(&readings, &actions);

        assert!(analyze_trigger(&series, 0, Side::Left, &LookaheadWindow::default()).is_none());
    }

    #[test]
    fn busy_short_tail_yields_none() {
        // Candidates at offsets 3 and 4 are both still acting and the
        // forced offset is past the end of the series.
        let readings = [2.0, 2.1, 2.2, 2.3, 2.4];
        let actions = [1, 1, 1, 1, 1];
        let series = left_series(&readings, &actions);

        assert!(analyze_trigger(&series, 0, Side::Left, &LookaheadWindow::default()).is_none());
    }

    #[test]
    fn idle_sample_yields_none() {
        let readings = [3.0, 3.0, 3.0, 3.0, 3.0, 3.0];
        let actions = [0, 0, 0, 0, 0, 0];
        let series = left_series(&readings, &actions);

        assert!(analyze_trigger(&series, 0, Side::Left, &LookaheadWindow::default()).is_none());
    }

    #[test]
    fn zero_settled_value_gives_zero_percent() {
        let readings = [2.0, 2.0, 2.0, 0.0, 0.0, 0.0];
        let actions = [1, 0, 0, 0, 0, 0];
        let series = left_series(&readings, &actions);

        let effect =
            analyze_trigger(&series, 0, Side::Left, &LookaheadWindow::default()).unwrap();
        assert_eq!(effect.settled, 0.0);
        assert_eq!(effect.change_pct, 0.0);
        assert!((effect.change_mm - 2.0).abs() < 1e-12);
    }

    // -- analyze_series -------------------------------------------------------

    #[test]
    fn analyze_series_collects_measurable_triggers_only() {
        // Trigger at index 0 is measurable; the one near the end is not.
        let readings = [2.0, 2.1, 2.2, 3.0, 3.0, 3.0, 3.0, 2.9, 3.0];
        let actions = [1, 0, 0, 0, 0, 0, 0, 2, 0];
        let series = left_series(&readings, &actions);

        let effects = analyze_series(&series, &LookaheadWindow::default());
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].sample_index, 0);
        assert_eq!(effects[0].action, CorrectionAction::Thin);
    }
}
