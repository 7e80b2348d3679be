//! Per-batch thickness statistics.
//!
//! Averages use positive sensor readings only (a zero reading means the
//! sensor saw no sheet); MAE is measured against the per-sample standard
//! midpoint wherever one was recorded.

use serde::Serialize;

use crate::sample::Side;
use crate::series::SampleSeries;
use crate::stats::{mean, sample_stddev};

// ---------------------------------------------------------------------------
// Side summary
// ---------------------------------------------------------------------------

/// Thickness statistics for one side of the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SideSummary {
    /// Mean thickness over positive readings, mm.
    pub avg: f64,
    /// Mean absolute error against the standard midpoint, mm.
    pub mae: f64,
    /// Sample standard deviation (n-1) of positive readings; 0 for
    /// fewer than two readings by convention.
    pub ssd: f64,
    /// Number of positive readings that fed `avg` and `ssd`.
    pub reading_count: usize,
    /// Number of readings with a defined standard midpoint that fed `mae`.
    pub mae_count: usize,
}

/// Summarize one side of a series.
pub fn summarize_side(series: &SampleSeries, side: Side) -> SideSummary {
    let readings: Vec<f64> = series
        .samples()
        .iter()
        .map(|s| s.sensor_on(side))
        .filter(|&v| v > 0.0)
        .collect();

    let errors: Vec<f64> = series
        .samples()
        .iter()
        .filter_map(|s| s.std_mid.map(|mid| (s.sensor_on(side) - mid).abs()))
        .collect();

    SideSummary {
        avg: mean(&readings),
        mae: mean(&errors),
        ssd: sample_stddev(&readings),
        reading_count: readings.len(),
        mae_count: errors.len(),
    }
}

// ---------------------------------------------------------------------------
// Combined summary
// ---------------------------------------------------------------------------

/// Thickness statistics for a whole batch: both sides plus the combined
/// figures the reports show.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThicknessSummary {
    pub left: SideSummary,
    pub right: SideSummary,
    /// Mean of the two side averages, mm.
    pub avg: f64,
    /// Mean of the two side MAEs, mm.
    pub mae: f64,
    /// Mean of the two side SSDs.
    pub ssd: f64,
    /// Signed left-minus-right average difference; positive means the
    /// left edge runs thicker. Never clamped.
    pub balance: f64,
}

/// Summarize both sides of a series.
pub fn summarize(series: &SampleSeries) -> ThicknessSummary {
    let left = summarize_side(series, Side::Left);
    let right = summarize_side(series, Side::Right);

    ThicknessSummary {
        left,
        right,
        avg: (left.avg + right.avg) / 2.0,
        mae: (left.mae + right.mae) / 2.0,
        ssd: (left.ssd + right.ssd) / 2.0,
        balance: left.avg - right.avg,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{CorrectionAction, Sample};
    use crate::series::SampleSeries;
    use chrono::NaiveDate;

    fn series_from(readings: &[(f64, f64, Option<f64>)]) -> SampleSeries {
        let base = NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let samples = readings
            .iter()
            .enumerate()
            .map(|(i, &(left, right, std_mid))| Sample {
                taken_at: base + chrono::Duration::seconds(i as i64),
                is_correcting: false,
                action_left: CorrectionAction::None,
                action_right: CorrectionAction::None,
                sensor_left: left,
                sensor_right: right,
                recipe_id: None,
                std_min: None,
                std_max: None,
                std_mid,
            })
            .collect();
        SampleSeries::new(samples).unwrap()
    }

    // -- summarize_side -------------------------------------------------------

    #[test]
    fn average_ignores_zero_readings() {
        let series = series_from(&[(3.0, 1.0, None), (0.0, 1.0, None), (2.0, 1.0, None)]);
        let left = summarize_side(&series, Side::Left);
        assert!((left.avg - 2.5).abs() < 1e-12);
        assert_eq!(left.reading_count, 2);
    }

    #[test]
    fn mae_uses_samples_with_standard_midpoint() {
        let series = series_from(&[
            (3.2, 1.0, Some(3.0)),
            (2.9, 1.0, None),
            (2.8, 1.0, Some(3.0)),
        ]);
        let left = summarize_side(&series, Side::Left);
        // |3.2-3.0| and |2.8-3.0| only.
        assert!((left.mae - 0.2).abs() < 1e-12);
        assert_eq!(left.mae_count, 2);
    }

    #[test]
    fn ssd_is_zero_for_single_reading() {
        let series = series_from(&[(3.0, 1.0, None), (0.0, 1.0, None)]);
        let left = summarize_side(&series, Side::Left);
        assert_eq!(left.ssd, 0.0);
    }

    #[test]
    fn no_positive_readings_degrade_to_zero() {
        let series = series_from(&[(0.0, 1.0, None), (0.0, 1.0, None)]);
        let left = summarize_side(&series, Side::Left);
        assert_eq!(left.avg, 0.0);
        assert_eq!(left.ssd, 0.0);
        assert_eq!(left.reading_count, 0);
    }

    // -- summarize ------------------------------------------------------------

    #[test]
    fn balance_is_exact_side_difference() {
        let series = series_from(&[(3.2, 3.0, None), (3.2, 3.0, None)]);
        let summary = summarize(&series);
        assert!((summary.balance - 0.2).abs() < 1e-12);
        assert!((summary.avg - 3.1).abs() < 1e-12);
    }

    #[test]
    fn balance_sign_follows_thicker_side() {
        let series = series_from(&[(2.8, 3.0, None)]);
        let summary = summarize(&series);
        assert!(summary.balance < 0.0);
    }

    #[test]
    fn mae_of_known_dip_is_point_three() {
        // sensor_left 3,3,3,2,2,2,3,3,3,3 against std_mid 3.0 -> MAE 0.3.
        let readings: Vec<(f64, f64, Option<f64>)> =
            [3.0, 3.0, 3.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 3.0]
                .iter()
                .map(|&v| (v, 3.0, Some(3.0)))
                .collect();
        let series = series_from(&readings);
        let left = summarize_side(&series, Side::Left);
        assert!((left.mae - 0.3).abs() < 1e-12);
    }

    #[test]
    fn summarizing_twice_is_identical() {
        let series = series_from(&[(3.1, 3.0, Some(3.05)), (2.9, 3.0, Some(3.05))]);
        assert_eq!(summarize(&series), summarize(&series));
    }
}
