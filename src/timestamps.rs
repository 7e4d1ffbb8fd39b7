//! `created` attribute formatting, parsing, and the stamp clock used by writes.

use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, Utc};
use std::sync::{Mutex, PoisonError};

/// Fixed microsecond precision, so lexicographic order matches time order.
pub const CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

const NAIVE_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub fn format_created(at: DateTime<Utc>) -> String {
    at.format(CREATED_FORMAT).to_string()
}

/// Parse a stored `created` value.
///
/// Accepts RFC 3339 (with offset) as well as naive ISO-8601 timestamps with
/// an optional fractional part; naive values are read as UTC.
pub fn parse_created(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_PARSE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Hands out `created` stamps that never go backwards.
///
/// Every stamp is strictly later than the previous one issued by this clock
/// and than the optional floor supplied by the caller (the `created` of the
/// object being replaced).
#[derive(Debug, Default)]
pub struct StampClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl StampClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_after(&self, floor: Option<DateTime<Utc>>) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stamp = Utc::now().trunc_subsecs(6);
        for bound in [*last, floor].into_iter().flatten() {
            let bound = bound.trunc_subsecs(6);
            if stamp <= bound {
                stamp = bound + Duration::microseconds(1);
            }
        }
        *last = Some(stamp);
        stamp
    }
}
