//! Raw sample model and wire-tuple decoding.
//!
//! The capture daemon stores each batch as a JSON array of arrays, one
//! inner array per tick. Decoding into named fields happens exactly once
//! here, at the ingestion boundary; nothing downstream indexes tuples by
//! position.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// Timestamp format written by the capture daemon.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Field count of the legacy tuple layout:
/// `[timestamp, is_correcting, action_left, action_right, sensor_left, sensor_right]`.
pub const LEGACY_TUPLE_LEN: usize = 6;

/// Field count of the full tuple layout, which appends
/// `[recipe_id, std_min, std_max, std_mid]` to the legacy fields.
pub const FULL_TUPLE_LEN: usize = 10;

// ---------------------------------------------------------------------------
// Sides
// ---------------------------------------------------------------------------

/// One edge of the calendered sheet. Each side has its own thickness
/// sensor and its own correction actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

// ---------------------------------------------------------------------------
// Correction actions
// ---------------------------------------------------------------------------

/// Correction-trigger state of one side at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionAction {
    /// No trigger fired.
    None,
    /// Push toward a thinner sheet.
    Thin,
    /// Push toward a thicker sheet.
    Thicken,
}

impl CorrectionAction {
    /// Decode the wire code (0 = none, 1 = thin, 2 = thicken).
    pub fn from_code(code: i64) -> Result<Self, CoreError> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Thin),
            2 => Ok(Self::Thicken),
            other => Err(CoreError::MalformedSample(format!(
                "action code out of range: {other}"
            ))),
        }
    }

    /// Wire code for exports.
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Thin => 1,
            Self::Thicken => 2,
        }
    }

    /// Display label; the idle state renders as an empty cell.
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Thin => "thin",
            Self::Thicken => "thicken",
        }
    }

    /// Whether a trigger actually fired.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::None)
    }
}

// ---------------------------------------------------------------------------
// Sample
// ---------------------------------------------------------------------------

/// One tick of the capture: both sensors, both trigger states, and the
/// recipe standard band the machine was running at that moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub taken_at: Timestamp,
    pub is_correcting: bool,
    pub action_left: CorrectionAction,
    pub action_right: CorrectionAction,
    /// Measured thickness in mm; never negative.
    pub sensor_left: f64,
    pub sensor_right: f64,
    pub recipe_id: Option<DbId>,
    pub std_min: Option<f64>,
    pub std_max: Option<f64>,
    pub std_mid: Option<f64>,
}

impl Sample {
    pub fn action_on(&self, side: Side) -> CorrectionAction {
        match side {
            Side::Left => self.action_left,
            Side::Right => self.action_right,
        }
    }

    pub fn sensor_on(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.sensor_left,
            Side::Right => self.sensor_right,
        }
    }

    /// Whether either side has an active trigger at this tick.
    pub fn has_any_action(&self) -> bool {
        self.action_left.is_active() || self.action_right.is_active()
    }
}

// ---------------------------------------------------------------------------
// Tuple decoding
// ---------------------------------------------------------------------------

/// Decode one wire tuple into a [`Sample`].
///
/// Accepts both the legacy 6-field layout and the full 10-field layout;
/// missing recipe/standard fields come back as `None`. Any other shape,
/// an unparseable timestamp, an out-of-range action code or a negative
/// sensor reading is a [`CoreError::MalformedSample`] — callers skip the
/// single sample and keep the series.
pub fn decode_sample(raw: &Value) -> Result<Sample, CoreError> {
    let fields = raw
        .as_array()
        .ok_or_else(|| CoreError::MalformedSample("tuple is not an array".to_string()))?;

    if fields.len() != LEGACY_TUPLE_LEN && fields.len() != FULL_TUPLE_LEN {
        return Err(CoreError::MalformedSample(format!(
            "tuple has {} fields, expected {LEGACY_TUPLE_LEN} or {FULL_TUPLE_LEN}",
            fields.len()
        )));
    }

    let taken_at = decode_timestamp(&fields[0])?;
    let is_correcting = decode_bool(&fields[1])?;
    let action_left = CorrectionAction::from_code(decode_int(&fields[2], "action_left")?)?;
    let action_right = CorrectionAction::from_code(decode_int(&fields[3], "action_right")?)?;
    let sensor_left = decode_sensor(&fields[4], "sensor_left")?;
    let sensor_right = decode_sensor(&fields[5], "sensor_right")?;

    let (recipe_id, std_min, std_max, std_mid) = if fields.len() == FULL_TUPLE_LEN {
        (
            decode_opt_int(&fields[6], "recipe_id")?,
            decode_opt_f64(&fields[7], "std_min")?,
            decode_opt_f64(&fields[8], "std_max")?,
            decode_opt_f64(&fields[9], "std_mid")?,
        )
    } else {
        (None, None, None, None)
    };

    Ok(Sample {
        taken_at,
        is_correcting,
        action_left,
        action_right,
        sensor_left,
        sensor_right,
        recipe_id,
        std_min,
        std_max,
        std_mid,
    })
}

fn decode_timestamp(v: &Value) -> Result<Timestamp, CoreError> {
    let s = v
        .as_str()
        .ok_or_else(|| CoreError::MalformedSample("timestamp is not a string".to_string()))?;
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|_| CoreError::MalformedSample(format!("unparseable timestamp: '{s}'")))
}

fn decode_bool(v: &Value) -> Result<bool, CoreError> {
    // The daemon wrote booleans; older captures carry 0/1 integers.
    match v {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        other => Err(CoreError::MalformedSample(format!(
            "is_correcting is neither bool nor number: {other}"
        ))),
    }
}

fn decode_int(v: &Value, name: &str) -> Result<i64, CoreError> {
    v.as_i64()
        .ok_or_else(|| CoreError::MalformedSample(format!("{name} is not an integer")))
}

fn decode_sensor(v: &Value, name: &str) -> Result<f64, CoreError> {
    let value = v
        .as_f64()
        .ok_or_else(|| CoreError::MalformedSample(format!("{name} is not a number")))?;
    if value < 0.0 {
        return Err(CoreError::MalformedSample(format!(
            "{name} is negative: {value}"
        )));
    }
    Ok(value)
}

fn decode_opt_int(v: &Value, name: &str) -> Result<Option<DbId>, CoreError> {
    if v.is_null() {
        return Ok(None);
    }
    decode_int(v, name).map(Some)
}

fn decode_opt_f64(v: &Value, name: &str) -> Result<Option<f64>, CoreError> {
    if v.is_null() {
        return Ok(None);
    }
    v.as_f64()
        .map(Some)
        .ok_or_else(|| CoreError::MalformedSample(format!("{name} is not a number")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    // -- CorrectionAction -----------------------------------------------------

    #[test]
    fn action_codes_round_trip() {
        for code in 0..=2 {
            let action = CorrectionAction::from_code(code).unwrap();
            assert_eq!(action.code() as i64, code);
        }
    }

    #[test]
    fn action_code_out_of_range_rejected() {
        assert_matches!(
            CorrectionAction::from_code(3),
            Err(CoreError::MalformedSample(_))
        );
        assert_matches!(
            CorrectionAction::from_code(-1),
            Err(CoreError::MalformedSample(_))
        );
    }

    #[test]
    fn only_none_is_inactive() {
        assert!(!CorrectionAction::None.is_active());
        assert!(CorrectionAction::Thin.is_active());
        assert!(CorrectionAction::Thicken.is_active());
    }

    // -- decode_sample --------------------------------------------------------

    #[test]
    fn full_tuple_decodes() {
        let raw = json!([
            "2025-05-01 08:15:00",
            true,
            1,
            0,
            3.05,
            3.02,
            7,
            3.0,
            3.1,
            3.05
        ]);
        let sample = decode_sample(&raw).unwrap();
        assert!(sample.is_correcting);
        assert_eq!(sample.action_left, CorrectionAction::Thin);
        assert_eq!(sample.action_right, CorrectionAction::None);
        assert_eq!(sample.sensor_left, 3.05);
        assert_eq!(sample.recipe_id, Some(7));
        assert_eq!(sample.std_mid, Some(3.05));
    }

    #[test]
    fn legacy_tuple_decodes_with_none_standards() {
        let raw = json!(["2024-05-01 08:15:00", 0, 0, 2, 2.95, 3.0]);
        let sample = decode_sample(&raw).unwrap();
        assert!(!sample.is_correcting);
        assert_eq!(sample.action_right, CorrectionAction::Thicken);
        assert_eq!(sample.recipe_id, None);
        assert_eq!(sample.std_min, None);
        assert_eq!(sample.std_max, None);
        assert_eq!(sample.std_mid, None);
    }

    #[test]
    fn null_standard_fields_tolerated() {
        let raw = json!(["2024-05-01 08:15:00", 0, 0, 0, 2.95, 3.0, null, null, null, null]);
        let sample = decode_sample(&raw).unwrap();
        assert_eq!(sample.recipe_id, None);
        assert_eq!(sample.std_mid, None);
    }

    #[test]
    fn unparseable_timestamp_rejected() {
        let raw = json!(["yesterday", 0, 0, 0, 2.95, 3.0]);
        assert_matches!(decode_sample(&raw), Err(CoreError::MalformedSample(_)));
    }

    #[test]
    fn bad_action_code_rejected() {
        let raw = json!(["2024-05-01 08:15:00", 0, 5, 0, 2.95, 3.0]);
        assert_matches!(decode_sample(&raw), Err(CoreError::MalformedSample(_)));
    }

    #[test]
    fn negative_sensor_rejected() {
        let raw = json!(["2024-05-01 08:15:00", 0, 0, 0, -0.5, 3.0]);
        assert_matches!(decode_sample(&raw), Err(CoreError::MalformedSample(_)));
    }

    #[test]
    fn wrong_arity_rejected() {
        let raw = json!(["2024-05-01 08:15:00", 0, 0]);
        assert_matches!(decode_sample(&raw), Err(CoreError::MalformedSample(_)));
    }

    #[test]
    fn non_array_rejected() {
        let raw = json!({"timestamp": "2024-05-01 08:15:00"});
        assert_matches!(decode_sample(&raw), Err(CoreError::MalformedSample(_)));
    }

    // -- Sample accessors -----------------------------------------------------

    #[test]
    fn side_accessors() {
        let raw = json!(["2024-05-01 08:15:00", 1, 1, 2, 2.9, 3.1]);
        let sample = decode_sample(&raw).unwrap();
        assert_eq!(sample.action_on(Side::Left), CorrectionAction::Thin);
        assert_eq!(sample.action_on(Side::Right), CorrectionAction::Thicken);
        assert_eq!(sample.sensor_on(Side::Left), 2.9);
        assert_eq!(sample.sensor_on(Side::Right), 3.1);
        assert!(sample.has_any_action());
    }
}
