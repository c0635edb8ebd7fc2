//! Small shared helpers.

use chrono::Local;

/// Today's calendar date as `YYYY-MM-DD`.
///
/// Uses the server's local wall clock, matching the behavior of the stored
/// `lastRequestDate` field: dates are compared for equality only, so the
/// reset boundary is the server's local midnight with no explicit timezone
/// policy.
pub fn today_date_string() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}
