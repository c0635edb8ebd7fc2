//! chatgate — a quota-enforcing chat completion gateway.
//!
//! A single `POST /v1/chat` endpoint proxies a user's prompt (optionally with
//! an inlined image) to the OpenAI chat-completions API while enforcing a
//! per-user daily request quota backed by a pluggable document store.
//!
//! Pipeline: validate → read limit and usage concurrently → allow/block →
//! prepare content → call upstream → record acceptance (best-effort) →
//! assemble the response envelope. See [`orchestrator::Orchestrator`].

pub mod api;
pub mod content;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod quota;
pub mod response;
pub mod settings;
pub mod store;
pub mod utils;

pub use error::{GateError, Result};
