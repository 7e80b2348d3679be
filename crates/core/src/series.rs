//! Ordered per-batch sample series.
//!
//! A series is produced once, at batch completion, and never mutated.
//! All per-batch analytics derive from it on demand.

use serde_json::Value;

use crate::error::CoreError;
use crate::sample::{decode_sample, Sample};
use crate::shift::Shift;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// SampleSeries
// ---------------------------------------------------------------------------

/// Ordered, non-empty sequence of samples for exactly one batch.
///
/// Construction validates the ordering invariant (timestamps
/// non-decreasing); after that the series is immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries {
    samples: Vec<Sample>,
}

impl SampleSeries {
    pub fn new(samples: Vec<Sample>) -> Result<Self, CoreError> {
        if samples.is_empty() {
            return Err(CoreError::EmptySeries);
        }
        for pair in samples.windows(2) {
            if pair[1].taken_at < pair[0].taken_at {
                return Err(CoreError::Validation(format!(
                    "sample timestamps must be non-decreasing: {} precedes {}",
                    pair[1].taken_at, pair[0].taken_at
                )));
            }
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// A constructed series is never empty; this exists for symmetry
    /// with slice APIs.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn started_at(&self) -> Timestamp {
        self.samples[0].taken_at
    }

    pub fn ended_at(&self) -> Timestamp {
        self.samples[self.samples.len() - 1].taken_at
    }

    pub fn duration(&self) -> chrono::Duration {
        self.ended_at() - self.started_at()
    }

    /// The shift the batch started in.
    pub fn shift(&self) -> Shift {
        Shift::from_timestamp(self.started_at())
    }
}

// ---------------------------------------------------------------------------
// Capture decoding
// ---------------------------------------------------------------------------

/// Result of decoding a raw capture array.
///
/// Malformed tuples are skipped, not fatal: `series` is `None` only when
/// no tuple at all survived. Callers surface `skipped` at their boundary.
#[derive(Debug)]
pub struct DecodeOutcome {
    pub series: Option<SampleSeries>,
    pub decoded: usize,
    pub skipped: usize,
}

/// Decode a capture (JSON array of wire tuples) into a series.
///
/// Returns an error only when `raw` is not an array; individual bad
/// tuples are counted in [`DecodeOutcome::skipped`].
pub fn decode_series(raw: &Value) -> Result<DecodeOutcome, CoreError> {
    let tuples = raw
        .as_array()
        .ok_or_else(|| CoreError::Validation("capture data is not an array".to_string()))?;

    let mut samples = Vec::with_capacity(tuples.len());
    let mut skipped = 0usize;
    for tuple in tuples {
        match decode_sample(tuple) {
            Ok(sample) => samples.push(sample),
            Err(_) => skipped += 1,
        }
    }

    let decoded = samples.len();
    let series = if samples.is_empty() {
        None
    } else {
        // The daemon appends in capture order; a disordered capture is
        // rejected wholesale rather than silently reordered.
        Some(SampleSeries::new(samples)?)
    };

    Ok(DecodeOutcome {
        series,
        decoded,
        skipped,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
