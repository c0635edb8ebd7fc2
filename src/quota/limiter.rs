//! Pure allow/block decision: usage vs. limit.

use crate::utils::today_date_string;

/// User-facing message returned when the daily limit is reached.
pub const LIMIT_REACHED_MESSAGE: &str = "Daily request limit reached! Please try again tomorrow.";

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Requests left after the one about to be made (0 when blocked).
    pub remaining: u32,
    /// Usage observed at decision time.
    pub current: u32,
    /// The configured daily limit.
    pub limit: u32,
    /// The counter resets at the next calendar day; this is today's date.
    pub reset_date: String,
}

/// Decide whether a request with `usage` accepted requests today may proceed
/// against `limit`.
///
/// `remaining` accounts for the request about to be made: an allowed request
/// at `usage = limit - 1` reports `remaining = 0`. Pure; no failure mode.
pub fn decide(usage: u32, limit: u32) -> RateLimitDecision {
    let allowed = usage < limit;
    RateLimitDecision {
        allowed,
        remaining: if allowed {
            limit.saturating_sub(usage + 1)
        } else {
            0
        },
        current: usage,
        limit,
        reset_date: today_date_string(),
    }
}
