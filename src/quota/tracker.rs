//! Per-user usage tracking with calendar-day rollover.
//!
//! The stored record (`users/<userId>`) carries `dailyRequestCount`,
//! `lastRequestDate` (a `YYYY-MM-DD` string compared for equality only) and
//! `totalRequest`. A stored date other than today means the counter logically
//! reset to zero; the reset is not persisted until the next accepted request
//! writes the record.

use serde_json::json;
use tracing::warn;

use crate::error::{GateError, Result};
use crate::store::{DocumentStore, USERS_COLLECTION};
use crate::utils::today_date_string;

/// Snapshot of a user's quota usage at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    /// Requests already accepted today (0 after a day rollover).
    pub count: u32,
    /// Whether a stored record exists for this user.
    pub record_exists: bool,
}

/// Outcome of recording an accepted request.
///
/// `reported_count` is what the response uses; `persisted` is ground truth
/// about whether the write landed. The two can diverge on a transient write
/// failure, which is logged but never surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    pub reported_count: u32,
    pub persisted: bool,
}

/// Load the user's current daily usage, applying day rollover.
///
/// Absent record → `{count: 0, record_exists: false}`. Present record with a
/// stale `lastRequestDate` → `{count: 0, record_exists: true}`. Read failures
/// surface as [`GateError::Storage`].
pub async fn get_usage(store: &dyn DocumentStore, user_id: &str) -> Result<Usage> {
    let doc = store
        .get(USERS_COLLECTION, user_id)
        .await
        .map_err(|e| GateError::Storage(e.to_string()))?;

    let Some(doc) = doc else {
        return Ok(Usage {
            count: 0,
            record_exists: false,
        });
    };

    let stored_count = doc["dailyRequestCount"].as_u64().unwrap_or(0) as u32;
    let last_date = doc["lastRequestDate"].as_str().unwrap_or("");

    // A stored date other than today means the counter logically reset.
    let count = if last_date == today_date_string() {
        stored_count
    } else {
        0
    };

    Ok(Usage {
        count,
        record_exists: true,
    })
}

/// Record acceptance of one request, best-effort.
///
/// Persists `observed_count + 1` together with today's date and the bumped
/// lifetime total. A persistence failure is logged and swallowed: the caller
/// always gets `reported_count = observed_count + 1` so that a transient
/// storage failure never turns a successful completion into a user-visible
/// error. Never retried; called at most once per accepted request.
pub async fn record_accepted(
    store: &dyn DocumentStore,
    user_id: &str,
    observed_count: u32,
    record_exists: bool,
) -> RecordOutcome {
    let new_count = observed_count + 1;
    let persisted = persist_acceptance(store, user_id, new_count, record_exists).await;

    if let Err(e) = &persisted {
        warn!(
            user_id = %user_id,
            reported_count = new_count,
            error = %e,
            "quota: failed to persist request count; reported and stored usage may drift",
        );
    }

    RecordOutcome {
        reported_count: new_count,
        persisted: persisted.is_ok(),
    }
}

async fn persist_acceptance(
    store: &dyn DocumentStore,
    user_id: &str,
    new_count: u32,
    record_exists: bool,
) -> Result<()> {
    let stored_total = if record_exists {
        store
            .get(USERS_COLLECTION, user_id)
            .await?
            .map(|doc| doc["totalRequest"].as_u64().unwrap_or(0))
            .unwrap_or(0)
    } else {
        0
    };

    store
        .merge(
            USERS_COLLECTION,
            user_id,
            json!({
                "dailyRequestCount": new_count,
                "lastRequestDate": today_date_string(),
                "totalRequest": stored_total + 1,
            }),
        )
        .await
}
