use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Summarizer, SummarizerError, Summary, SummaryOptions};
use crate::config::SummarizerConfig;
use crate::models::TokenUsage;

const SUMMARY_INSTRUCTIONS: &str = r#"I need a daily email that will allow me to stay up to date on what's going on in discord channels. write a detailed news report as a journalist. Never say "a user" always use their username. No fluff preamble.

bad: soandso expressed excitement about whatever
good: soandso is excited about whatever

bad: soandso commented on whatever, indicating wanting to get it later
good: soandso wants to get whatever

if you mention a tip, technique, or resource, link it. (always link the noun like "github repo" and never "you can find the repo here

"#;

/// Build the single user prompt sent to the chat completion endpoint.
pub fn build_prompt(transcript: &str) -> String {
    format!("{SUMMARY_INSTRUCTIONS}{transcript}")
}

/// Summarizer backed by an OpenAI-compatible chat completion API.
#[derive(Clone)]
pub struct OpenAiSummarizer {
    http: reqwest::Client,
    api_key: String,
    config: SummarizerConfig,
}

impl OpenAiSummarizer {
    pub fn new(config: SummarizerConfig) -> Result<Self, SummarizerError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(SummarizerError::NotConfigured("OPENAI_API_KEY is not set"))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent("channel-digest/0.1")
            .build()?;

        Ok(Self {
            http,
            api_key,
            config,
        })
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    fn request_for<'a>(&'a self, prompt: &'a str, options: &'a SummaryOptions) -> ChatRequest<'a> {
        ChatRequest {
            model: options.model.as_deref().unwrap_or(&self.config.model),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
        }
    }
}

#[rocket::async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(
        &self,
        transcript: &str,
        options: &SummaryOptions,
    ) -> Result<Summary, SummarizerError> {
        let prompt = build_prompt(transcript);
        let payload = self.request_for(&prompt, options);
        let endpoint = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        log::debug!(
            "summarizer: requesting {} (max_tokens={}, transcript {} bytes)",
            payload.model,
            payload.max_tokens,
            transcript.len()
        );

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("summarizer: backend returned {}: {}", status, body);
            return Err(SummarizerError::Service { status, body });
        }

        let body = response.bytes().await?;
        parse_chat_response(&body)
    }
}

fn parse_chat_response(body: &[u8]) -> Result<Summary, SummarizerError> {
    let parsed: ChatResponse = serde_json::from_slice(body)?;
    let summary = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(SummarizerError::EmptyResponse)?;

    Ok(Summary {
        summary,
        usage: parsed.usage.unwrap_or_default(),
    })
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
