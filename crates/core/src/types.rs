/// Database primary keys on the reporting side are BIGSERIAL.
pub type DbId = i64;

/// Plant timestamps are local wall-clock time, exactly as the capture
/// daemon writes them. There is no zone information in the capture
/// format; shift and date grouping read the wall clock directly.
pub type Timestamp = chrono::NaiveDateTime;
