mod common;

use channel_digest::models::{ChannelSummary, TranscriptPreview};
use channel_digest::routes::summarize::{debug_channel, summarize_channel};
use channel_digest::store::InMemoryMessageStore;
use channel_digest::summarizer::UnconfiguredSummarizer;
use channel_digest::test_support::TestRocketBuilder;
use chrono::Duration;
use common::{FailingSummarizer, RecordingSummarizer, base_time, message};
use rocket::http::Status;
use rocket::routes;

fn seeded_store() -> InMemoryMessageStore {
    let t0 = base_time();
    let mut reply = message("2", "bob", "hi back", t0 + Duration::minutes(1));
    reply.reply_to_id = Some("1".to_string());
    let late = message("3", "carol", "next day", t0 + Duration::days(2));

    InMemoryMessageStore::new(vec![message("1", "alice", "hello", t0), reply, late])
}

const WINDOW: &str = "startDate=2025-04-03&endDate=2025-04-04";

#[test]
fn debug_previews_transcript() {
    let client = TestRocketBuilder::new()
        .manage_store(seeded_store())
        .mount_api_routes(routes![debug_channel])
        .blocking_client();

    let response = client
        .get(format!("/api/v1/summarize/debug/general?{WINDOW}"))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);

    let preview: TranscriptPreview = response.into_json().expect("preview");
    assert_eq!(preview.channel_id, "general");
    assert_eq!(preview.message_count, 2);
    assert_eq!(
        preview.formatted_messages,
        "[2025-04-03 09:30:00] alice: hello\n[2025-04-03 09:31:00] bob: hi back\n"
    );
}

#[test]
fn dates_are_required() {
    let client = TestRocketBuilder::new()
        .manage_store(seeded_store())
        .mount_api_routes(routes![debug_channel])
        .blocking_client();

    let response = client
        .get("/api/v1/summarize/debug/general?startDate=2025-04-03")
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);

    let body: serde_json::Value = response.into_json().expect("error body");
    assert_eq!(
        body["message"],
        "startDate and endDate query parameters are required"
    );
}

#[test]
fn empty_window_is_not_found() {
    let client = TestRocketBuilder::new()
        .manage_store(seeded_store())
        .mount_api_routes(routes![debug_channel])
        .blocking_client();

    let response = client
        .get(format!("/api/v1/summarize/debug/quiet-channel?{WINDOW}"))
        .dispatch();
    assert_eq!(response.status(), Status::NotFound);

    let body: serde_json::Value = response.into_json().expect("error body");
    assert_eq!(
        body["message"],
        "No messages found for the specified channel and time range"
    );
}

#[test]
fn summarize_forwards_transcript_and_overrides() {
    let summarizer = RecordingSummarizer::default();
    let client = TestRocketBuilder::new()
        .manage_store(seeded_store())
        .manage_summarizer(summarizer.clone())
        .mount_api_routes(routes![summarize_channel])
        .blocking_client();

    let response = client
        .get(format!(
            "/api/v1/summarize/channel/general?{WINDOW}&model=gpt-4o&maxTokens=500"
        ))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);

    let summary: ChannelSummary = response.into_json().expect("summary");
    assert_eq!(summary.message_count, 2);
    assert!(summary.summary.contains("shipped the release"));
    assert_eq!(summary.usage.total_tokens, 120);

    let calls = summarizer.calls.lock();
    assert_eq!(calls.len(), 1);
    let (transcript, options) = &calls[0];
    assert!(transcript.starts_with("[2025-04-03 09:30:00] alice: hello\n"));
    assert_eq!(options.model.as_deref(), Some("gpt-4o"));
    assert_eq!(options.max_tokens, Some(500));
}

#[test]
fn summarizer_failure_is_bad_gateway() {
    let client = TestRocketBuilder::new()
        .manage_store(seeded_store())
        .manage_summarizer(FailingSummarizer)
        .mount_api_routes(routes![summarize_channel])
        .blocking_client();

    let response = client
        .get(format!("/api/v1/summarize/channel/general?{WINDOW}"))
        .dispatch();
    assert_eq!(response.status(), Status::BadGateway);

    let body: serde_json::Value = response.into_json().expect("error body");
    assert_eq!(body["error"], "SummarizerError");
}

#[test]
fn unconfigured_summarizer_is_internal_error() {
    let client = TestRocketBuilder::new()
        .manage_store(seeded_store())
        .manage_summarizer(UnconfiguredSummarizer)
        .mount_api_routes(routes![summarize_channel])
        .blocking_client();

    let response = client
        .get(format!("/api/v1/summarize/channel/general?{WINDOW}"))
        .dispatch();
    assert_eq!(response.status(), Status::InternalServerError);
}
