//! End-to-end request orchestration.
//!
//! Flow: validate → read limit and usage concurrently → decide → (blocked
//! short-circuits with no upstream call and no write) → prepare content →
//! call the completion service → record acceptance best-effort → assemble
//! the success envelope. Every dependency is injected, so tests swap in
//! fakes for the store, the content preparer, and the completion backend.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::content::ContentPreparer;
use crate::error::Result;
use crate::openai::{ChatMessage, CompletionBackend};
use crate::quota;
use crate::response::{self, BlockedEnvelope, SuccessEnvelope};
use crate::store::DocumentStore;
use crate::{error::GateError, utils};

/// Model used when the request does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Completion token budget when the request does not set one.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// Inbound chat request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Prior messages, used verbatim and not validated beyond shape.
    #[serde(default)]
    pub chat_history: Option<Vec<ChatMessage>>,
}

impl ChatRequest {
    /// Require non-empty `prompt`, `role`, and `userId`.
    fn validate(&self) -> Result<()> {
        if self.prompt.is_empty() || self.role.is_empty() || self.user_id.is_empty() {
            return Err(GateError::Validation(
                "Missing required fields: prompt, role, and userId".into(),
            ));
        }
        Ok(())
    }
}

/// Terminal outcome of an orchestration that did not error.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    /// Completion served; respond 200.
    Served(SuccessEnvelope),
    /// Daily limit reached; respond 429. Not an error path.
    Blocked(BlockedEnvelope),
}

/// Composes the quota pipeline and the upstream call for one request.
pub struct Orchestrator {
    store: Arc<dyn DocumentStore>,
    preparer: Arc<dyn ContentPreparer>,
    backend: Arc<dyn CompletionBackend>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        preparer: Arc<dyn ContentPreparer>,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            store,
            preparer,
            backend,
        }
    }

    /// Run one request through the pipeline.
    ///
    /// Quota semantics: the limit check reads the counter, and the counter is
    /// only written after a successful completion. The read and the write are
    /// not transactionally coupled, so concurrent requests from one user can
    /// each observe a pre-increment count and all proceed — the daily limit
    /// is a soft cap under concurrency. The post-completion write is
    /// best-effort: it is awaited for ordering but its failure cannot fail
    /// the request.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatOutcome> {
        request.validate()?;

        let (limit, usage) = tokio::try_join!(
            quota::daily_limit(self.store.as_ref()),
            quota::get_usage(self.store.as_ref(), &request.user_id),
        )?;

        let decision = quota::decide(usage.count, limit);
        if !decision.allowed {
            info!(
                user_id = %request.user_id,
                current = decision.current,
                limit = decision.limit,
                "request blocked by daily quota",
            );
            return Ok(ChatOutcome::Blocked(response::blocked(&decision)));
        }

        let content = self
            .preparer
            .prepare(&request.prompt, request.image_url.as_deref())
            .await?;
        let messages = build_messages(request.chat_history.as_deref(), &request.role, content);

        let result = self
            .backend
            .complete(&messages, &request.model, request.max_tokens)
            .await?;

        let record = quota::record_accepted(
            self.store.as_ref(),
            &request.user_id,
            usage.count,
            usage.record_exists,
        )
        .await;

        info!(
            user_id = %request.user_id,
            count = record.reported_count,
            persisted = record.persisted,
            date = %utils::today_date_string(),
            "request served",
        );

        Ok(ChatOutcome::Served(response::success(
            &result,
            limit,
            record.reported_count,
            &request.model,
        )))
    }
}

/// Append the new `{role, content}` turn to any supplied history.
fn build_messages(
    history: Option<&[ChatMessage]>,
    role: &str,
    content: crate::content::MessageContent,
) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = history.map(<[_]>::to_vec).unwrap_or_default();
    messages.push(ChatMessage {
        role: role.to_string(),
        content,
    });
    messages
}
