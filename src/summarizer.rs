//! Narrative summarization through an OpenAI-compatible completion API.
//!
//! Extracted article text is truncated to a fixed prefix and sent to the
//! chat-completions endpoint with one of two system prompts:
//!
//! - [`SummaryStyle::Brief`]: an extremely concise ~50 word summary, suited
//!   to quick single-shot use.
//! - [`SummaryStyle::Broadcast`]: a ~250 word segment written for air, with
//!   an opening transition and a natural close.
//!
//! The word targets are instructions to the model, not guarantees; responses
//! are passed through unvalidated. Only the truncated prefix of a long
//! article is summarized: tail content past the cap is dropped, a documented
//! trade-off inherited from the size limits of the completion API.

use async_trait::async_trait;
use clap::ValueEnum;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Characters of article text sent to the model; the rest is dropped.
pub const DEFAULT_CONTENT_CAP: usize = 10_000;

/// Default completion model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default OpenAI-compatible API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const BRIEF_PROMPT: &str = "You are a news editor. Create an extremely concise, \
    engaging summary (around 50 words) of the following text content in a style \
    suitable for a news broadcast.";

const BROADCAST_PROMPT: &str = "You are a professional news anchor. Create an engaging news segment (around 250 words) that:
1. Starts with an engaging phrase like \"Our next story\", \"next up\", \"the next item\" or \"Moving on\"
2. Uses a conversational, engaging tone while maintaining journalistic integrity
3. Includes key details, context, and any relevant quotes or statistics
4. Ends with a natural transition or conclusion
5. Avoids technical jargon unless necessary
6. Focuses on the most important aspects of the story

Format the response as a complete news segment ready for broadcast.";

/// Which register the summary is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryStyle {
    /// ~50 word capsule summary.
    Brief,
    /// ~250 word on-air segment with opening and closing transitions.
    Broadcast,
}

impl SummaryStyle {
    fn system_prompt(self) -> &'static str {
        match self {
            SummaryStyle::Brief => BRIEF_PROMPT,
            SummaryStyle::Broadcast => BROADCAST_PROMPT,
        }
    }

    /// Completion budget per style. Brief summaries are capped hard so the
    /// model cannot ramble past the ~50 word target.
    fn max_tokens(self) -> u32 {
        match self {
            SummaryStyle::Brief => 100,
            SummaryStyle::Broadcast => 1000,
        }
    }
}

/// Errors produced while summarizing article text.
#[derive(Debug, thiserror::Error)]
pub enum SummarizationError {
    /// `OPENAI_API_KEY` was absent when the first completion was requested.
    #[error("OPENAI_API_KEY is not set")]
    MissingCredentials,
    /// The HTTP request failed at the transport level.
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The completion API answered with a non-success status.
    #[error("completion API returned HTTP {status}: {body}")]
    Api { status: StatusCode, body: String },
    /// The response body was not the expected JSON shape.
    #[error("failed to parse completion response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    /// The API succeeded but the message carried no content.
    #[error("completion response contained no content")]
    EmptyResponse,
}

/// Capability: condense extracted text into a spoken-word summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `content` in the given style.
    async fn summarize(
        &self,
        content: &str,
        style: SummaryStyle,
    ) -> Result<String, SummarizationError>;
}

/// [`Summarizer`] backed by an OpenAI-compatible chat-completions endpoint.
///
/// The API key is read from the environment at construction but only
/// validated on the first call that needs it, so credential-free dry runs
/// against mock pipelines stay possible.
#[derive(Debug, Clone)]
pub struct OpenAiSummarizer {
    api_key: Option<String>,
    model: String,
    base_url: String,
    content_cap: usize,
    client: Client,
}

impl OpenAiSummarizer {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            content_cap: DEFAULT_CONTENT_CAP,
            client: Client::new(),
        }
    }

    /// Build from `OPENAI_API_KEY`. A missing key is not an error here.
    pub fn from_env() -> Self {
        Self::new(std::env::var("OPENAI_API_KEY").ok())
    }

    /// Point at a different OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the completion model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the input truncation cap.
    pub fn with_content_cap(mut self, cap: usize) -> Self {
        self.content_cap = cap;
        self
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    #[instrument(level = "info", skip_all, fields(style = ?style))]
    async fn summarize(
        &self,
        content: &str,
        style: SummaryStyle,
    ) -> Result<String, SummarizationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SummarizationError::MissingCredentials)?;

        let prefix = truncate_to_chars(content, self.content_cap);
        debug!(
            chars = prefix.len(),
            dropped = content.len() - prefix.len(),
            "Summarizing article prefix"
        );

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: style.system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: prefix,
                },
            ],
            max_tokens: style.max_tokens(),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationError::Api { status, body });
        }

        let body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;
        let summary = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(SummarizationError::EmptyResponse)?;

        info!(chars = summary.len(), "Generated summary");
        Ok(summary)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Longest prefix of `s` holding at most `cap` characters, never splitting a
/// multi-byte character.
fn truncate_to_chars(s: &str, cap: usize) -> &str {
    match s.char_indices().nth(cap) {
        Some((index, _)) => &s[..index],
        None => s,
    }
}
