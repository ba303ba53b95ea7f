#![allow(dead_code)]

use std::sync::Arc;

use channel_digest::mailer::{DeliveryError, DeliveryReceipt, EmailTransport, OutgoingEmail};
use channel_digest::models::{Message, TokenUsage};
use channel_digest::summarizer::{Summarizer, SummarizerError, Summary, SummaryOptions};
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 3, 9, 30, 0).unwrap()
}

pub fn message(id: &str, author: &str, content: &str, created_at: DateTime<Utc>) -> Message {
    let mut message = Message::new(id, created_at);
    message.author_username = Some(author.to_string());
    message.author_id = Some(format!("user-{author}"));
    message.content = content.to_string();
    message.guild_id = Some("guild-1".to_string());
    message.channel_id = Some("general".to_string());
    message
}

/// `count` channel messages a minute apart starting at `start`.
pub fn channel_messages(channel: &str, start: DateTime<Utc>, count: usize) -> Vec<Message> {
    (0..count)
        .map(|i| {
            let mut msg = message(
                &format!("{channel}-{i}"),
                "alice",
                &format!("update {i}"),
                start + Duration::minutes(i as i64),
            );
            msg.channel_id = Some(channel.to_string());
            msg
        })
        .collect()
}

/// Summarizer that records every transcript and answers with a fixed text.
#[derive(Clone, Default)]
pub struct RecordingSummarizer {
    pub calls: Arc<Mutex<Vec<(String, SummaryOptions)>>>,
}

#[rocket::async_trait]
impl Summarizer for RecordingSummarizer {
    async fn summarize(
        &self,
        transcript: &str,
        options: &SummaryOptions,
    ) -> Result<Summary, SummarizerError> {
        self.calls
            .lock()
            .push((transcript.to_string(), options.clone()));
        Ok(Summary {
            summary: "## Highlights\n\n**alice** shipped the release".to_string(),
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 20,
                total_tokens: 120,
            },
        })
    }
}

/// Summarizer that always fails as an unreachable backend would.
pub struct FailingSummarizer;

#[rocket::async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(
        &self,
        _transcript: &str,
        _options: &SummaryOptions,
    ) -> Result<Summary, SummarizerError> {
        Err(SummarizerError::EmptyResponse)
    }
}

/// Transport that keeps every accepted email in memory.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

#[rocket::async_trait]
impl EmailTransport for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, DeliveryError> {
        email.validate()?;
        let mut sent = self.sent.lock();
        sent.push(email.clone());
        Ok(DeliveryReceipt {
            id: format!("<test-{}@example.com>", sent.len()),
        })
    }
}
