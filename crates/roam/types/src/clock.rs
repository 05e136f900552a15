//! Wall-clock parsing and duration formatting.
//!
//! Itinerary times arrive from form inputs as local date-time strings
//! without a zone. They stay naive throughout: trips are planned in
//! destination-local time and comparing across zones is out of scope.

use chrono::{NaiveDate, NaiveDateTime};

use crate::{TripError, TripResult};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a local date-time string, with or without seconds.
pub fn parse_datetime(raw: &str) -> TripResult<NaiveDateTime> {
    let raw = raw.trim();
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }
    Err(TripError::Validation(format!(
        "invalid date-time '{raw}', expected YYYY-MM-DDTHH:MM"
    )))
}

/// Parse a calendar date string.
pub fn parse_date(raw: &str) -> TripResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        TripError::Validation(format!("invalid date '{}', expected YYYY-MM-DD", raw.trim()))
    })
}

/// Human duration label between two times.
///
/// Whole minutes only, so "1h 30m", "45m", or "0m" for anything under
/// a minute. An open interval (no end time) reads as empty. Inverted
/// intervals clamp to "0m" rather than going negative.
pub fn duration_label(start: NaiveDateTime, end: Option<NaiveDateTime>) -> String {
    let Some(end) = end else {
        return String::new();
    };
    let total_minutes = (end - start).num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
