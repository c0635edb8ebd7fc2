//! Per-user daily request quota: limit lookup, usage tracking, and the pure
//! allow/block decision.

mod limiter;
mod limits;
mod tracker;

pub use limiter::{decide, RateLimitDecision, LIMIT_REACHED_MESSAGE};
pub use limits::daily_limit;
pub use tracker::{get_usage, record_accepted, RecordOutcome, Usage};

/// Key of the config document holding `userMaxRequests`.
pub const CONFIG_DOC: &str = "gpt";
