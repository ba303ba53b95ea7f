//! Emailed channel digests.
//!
//! Summarizes the most recent window of a channel (`since` ago until now) and
//! mails the result to a single recipient.

use chrono::Utc;
use rocket::{State, post, serde::json::Json};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use rocket_okapi::openapi;
use serde::Deserialize;

use crate::digest::{
    DigestMetadata, ReportFormat, compose_summary_email, lookback_window, parse_since,
};
use crate::error::ApiError;
use crate::mailer::SharedEmailTransport;
use crate::models::EmailSummaryResult;
use crate::routes::helpers::load_channel_window;
use crate::store::SharedMessageStore;
use crate::summarizer::{SharedSummarizer, SummaryOptions};
use crate::threading::render_transcript;

/// Request body for an emailed channel summary.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailSummaryRequest {
    /// Recipient address.
    #[serde(default)]
    pub to: Option<String>,
    /// Look-back period such as `24h`, `7d` or `2 days`.
    #[serde(default)]
    pub since: Option<String>,
    /// `html` (default) or `text`.
    #[serde(default)]
    pub format: Option<String>,
    /// Model override for the summarizer.
    #[serde(default)]
    pub model: Option<String>,
    /// Completion token budget override.
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest(message.to_string()))
}

/// Summarize recent channel activity and email it to a recipient.
#[openapi(tag = "Email Summaries")]
#[post("/email-summary/channel/<channel_id>", data = "<request>")]
pub async fn email_channel_summary(
    channel_id: String,
    request: Json<EmailSummaryRequest>,
    store: &State<SharedMessageStore>,
    summarizer: &State<SharedSummarizer>,
    mailer: &State<SharedEmailTransport>,
) -> Result<Json<EmailSummaryResult>, ApiError> {
    let request = request.into_inner();
    let to = required(&request.to, "Email recipient (to) is required")?;
    let since = required(&request.since, "Time period (since) is required")?;
    let period = parse_since(since)?;

    let (start, end) = lookback_window(Utc::now(), period, since)?;
    let messages = load_channel_window(store.inner().as_ref(), &channel_id, start, end).await?;
    let transcript = render_transcript(&messages);

    let options = SummaryOptions {
        model: request.model.clone().filter(|model| !model.trim().is_empty()),
        max_tokens: request.max_tokens,
    };
    let summary = summarizer.summarize(&transcript, &options).await?;

    let metadata = DigestMetadata {
        channel_id: channel_id.clone(),
        start,
        end,
        message_count: messages.len(),
    };
    let email = compose_summary_email(
        to,
        &summary.summary,
        &metadata,
        ReportFormat::parse(request.format.as_deref()),
        Utc::now(),
    );
    let receipt = mailer.send(&email).await?;

    log::info!(
        "emailed summary of channel {} ({} messages) to {} as {}",
        channel_id,
        messages.len(),
        to,
        receipt.id
    );

    Ok(Json(EmailSummaryResult {
        success: true,
        channel_id,
        to: to.to_string(),
        start_date: start,
        end_date: end,
        message_count: messages.len(),
        email_id: receipt.id,
    }))
}
