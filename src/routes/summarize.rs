//! Channel summary endpoints.

use rocket::{State, get, serde::json::Json};
use rocket_okapi::openapi;

use crate::error::ApiError;
use crate::models::{ChannelSummary, TranscriptPreview};
use crate::routes::helpers::load_channel_window;
use crate::routes::params::SummaryWindowParams;
use crate::store::SharedMessageStore;
use crate::summarizer::{SharedSummarizer, SummaryOptions};
use crate::threading::render_transcript;

/// Preview the transcript the summarizer would receive for a channel window.
#[openapi(tag = "Summaries")]
#[get("/summarize/debug/<channel_id>?<params..>")]
pub async fn debug_channel(
    channel_id: String,
    params: SummaryWindowParams,
    store: &State<SharedMessageStore>,
) -> Result<Json<TranscriptPreview>, ApiError> {
    let (start, end) = params.window()?;
    let messages = load_channel_window(store.inner().as_ref(), &channel_id, start, end).await?;

    Ok(Json(TranscriptPreview {
        channel_id,
        start_date: start,
        end_date: end,
        message_count: messages.len(),
        formatted_messages: render_transcript(&messages),
    }))
}

/// Summarize a channel's conversation over a time window.
#[openapi(tag = "Summaries")]
#[get("/summarize/channel/<channel_id>?<params..>")]
pub async fn summarize_channel(
    channel_id: String,
    params: SummaryWindowParams,
    store: &State<SharedMessageStore>,
    summarizer: &State<SharedSummarizer>,
) -> Result<Json<ChannelSummary>, ApiError> {
    let (start, end) = params.window()?;
    let messages = load_channel_window(store.inner().as_ref(), &channel_id, start, end).await?;
    let transcript = render_transcript(&messages);

    let options = SummaryOptions {
        model: params.model(),
        max_tokens: params.max_tokens,
    };
    let summary = summarizer.summarize(&transcript, &options).await?;
    log::info!(
        "summarized {} messages from channel {} ({} tokens)",
        messages.len(),
        channel_id,
        summary.usage.total_tokens
    );

    Ok(Json(ChannelSummary {
        channel_id,
        start_date: start,
        end_date: end,
        message_count: messages.len(),
        summary: summary.summary,
        usage: summary.usage,
    }))
}
