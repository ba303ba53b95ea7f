//! Narrative summaries of channel transcripts.

pub mod openai;

use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

use crate::models::TokenUsage;

pub use openai::OpenAiSummarizer;

/// Errors that can occur while generating a summary.
#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("summarizer is not configured: {0}")]
    NotConfigured(&'static str),
    #[error("summarizer HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("summarizer returned status {status}: {body}")]
    Service { status: StatusCode, body: String },
    #[error("failed to decode summarizer response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("summarizer response did not include any choices")]
    EmptyResponse,
}

/// Per-request overrides; unset fields fall back to the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryOptions {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub summary: String,
    pub usage: TokenUsage,
}

#[rocket::async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize a rendered transcript.
    async fn summarize(
        &self,
        transcript: &str,
        options: &SummaryOptions,
    ) -> Result<Summary, SummarizerError>;
}

pub type SharedSummarizer = Arc<dyn Summarizer>;

/// Stand-in used when no backend credentials are configured.
pub struct UnconfiguredSummarizer;

#[rocket::async_trait]
impl Summarizer for UnconfiguredSummarizer {
    async fn summarize(
        &self,
        _transcript: &str,
        _options: &SummaryOptions,
    ) -> Result<Summary, SummarizerError> {
        Err(SummarizerError::NotConfigured("OPENAI_API_KEY is not set"))
    }
}
