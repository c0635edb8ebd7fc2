//! Response envelopes for the chat endpoint.

use serde::Serialize;
use serde_json::Value;

use crate::error::GateError;
use crate::openai::CompletionResult;
use crate::quota::{RateLimitDecision, LIMIT_REACHED_MESSAGE};
use crate::utils::today_date_string;

/// Placeholder when the upstream returns empty or whitespace-only content.
const EMPTY_CONTENT_FALLBACK: &str = "No response generated";

/// 200 envelope for a served completion.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuccessEnvelope {
    pub success: bool,
    pub content: String,
    pub usage: Value,
    pub model: String,
    pub remaining_requests: i64,
    pub daily_reset_date: String,
}

/// 429 envelope for a blocked request.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockedEnvelope {
    pub content: String,
    pub error: String,
    pub current_requests: u32,
    pub max_requests: u32,
    pub reset_date: String,
}

/// Envelope for every other non-success outcome.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    pub status_code: u16,
}

/// Build the success envelope.
///
/// `count_after` is the daily count after this request was accepted (the
/// tracker's reported value, whether or not the write landed). The echoed
/// model prefers the upstream-reported one.
pub fn success(
    result: &CompletionResult,
    limit: u32,
    count_after: u32,
    requested_model: &str,
) -> SuccessEnvelope {
    let content = result.content.trim();
    SuccessEnvelope {
        success: true,
        content: if content.is_empty() {
            EMPTY_CONTENT_FALLBACK.to_string()
        } else {
            content.to_string()
        },
        usage: result.usage.clone(),
        model: result
            .model
            .clone()
            .unwrap_or_else(|| requested_model.to_string()),
        remaining_requests: i64::from(limit) - i64::from(count_after),
        daily_reset_date: today_date_string(),
    }
}

/// Build the 429 envelope from a blocked decision.
pub fn blocked(decision: &RateLimitDecision) -> BlockedEnvelope {
    BlockedEnvelope {
        content: LIMIT_REACHED_MESSAGE.to_string(),
        error: LIMIT_REACHED_MESSAGE.to_string(),
        current_requests: decision.current,
        max_requests: decision.limit,
        reset_date: decision.reset_date.clone(),
    }
}

/// Build the error envelope for a pipeline failure.
pub fn error(err: &GateError) -> ErrorEnvelope {
    ErrorEnvelope {
        success: false,
        error: err.to_string(),
        status_code: err.status_code(),
    }
}
