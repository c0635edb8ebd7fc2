//! Message content preparation: plain text, or text plus an inlined image.
//!
//! Image references are downloaded, base64-encoded, and embedded as a
//! `data:` URI so the completion payload is self-contained — the upstream
//! service never needs to reach the original image host.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GateError, Result};

/// Bound on the image download.
const IMAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Conventional client identity; some image hosts reject anonymous agents.
const IMAGE_USER_AGENT: &str = "Mozilla/5.0";

/// Content of a chat message: plain text or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One part of a multi-part message, in the OpenAI content-part shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Turns a prompt (+ optional image reference) into message content.
#[async_trait]
pub trait ContentPreparer: Send + Sync {
    async fn prepare(&self, prompt: &str, image_url: Option<&str>) -> Result<MessageContent>;
}

/// [`ContentPreparer`] that fetches image references over HTTP.
#[derive(Debug, Clone)]
pub struct HttpContentPreparer {
    client: Client,
}

impl HttpContentPreparer {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(IMAGE_TIMEOUT)
                .user_agent(IMAGE_USER_AGENT)
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Encode raw image bytes as a base64 `data:` URI.
    fn encode_data_uri(bytes: &[u8]) -> String {
        format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GateError::ImageProcessing(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GateError::ImageProcessing(format!(
                "Failed to download image: {}",
                response.status().as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GateError::ImageProcessing(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl Default for HttpContentPreparer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentPreparer for HttpContentPreparer {
    async fn prepare(&self, prompt: &str, image_url: Option<&str>) -> Result<MessageContent> {
        let Some(url) = image_url else {
            return Ok(MessageContent::Text(prompt.to_string()));
        };

        debug!(url = %url, "downloading image for multi-part content");
        let bytes = self.fetch_image(url).await?;

        Ok(MessageContent::Parts(vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: Self::encode_data_uri(&bytes),
                },
            },
        ]))
    }
}
