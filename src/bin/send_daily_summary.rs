use clap::Parser;
use serde_json::json;

use channel_digest::digest::parse_since;
use channel_digest::models::EmailSummaryResult;

#[derive(Parser, Debug)]
#[command(
    name = "send_daily_summary",
    about = "Email a channel summary to each recipient through a running API server"
)]
struct Args {
    /// Base URL of the API server.
    #[arg(long, default_value = "http://localhost:8000")]
    api_url: String,

    /// Channel to summarize.
    #[arg(long)]
    channel: String,

    /// Recipient address; repeat for several recipients.
    #[arg(long = "to", required = true)]
    to: Vec<String>,

    /// Look-back period such as `24h` or `7d`.
    #[arg(long, default_value = "24h")]
    since: String,

    /// `html` or `text`.
    #[arg(long, default_value = "html")]
    format: String,

    /// Model override for the summarizer.
    #[arg(long)]
    model: Option<String>,

    /// Completion token budget override.
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Bearer token sent in the `Authorization` header.
    #[arg(long)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    parse_since(&args.since)?;

    let url = format!(
        "{}/api/v1/email-summary/channel/{}",
        args.api_url.trim_end_matches('/'),
        args.channel
    );
    let client = reqwest::Client::new();
    let mut failures = 0usize;

    for recipient in &args.to {
        let body = json!({
            "to": recipient,
            "since": args.since,
            "format": args.format,
            "model": args.model,
            "maxTokens": args.max_tokens,
        });

        let mut request = client.post(&url).json(&body);
        if let Some(token) = &args.token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                let result: EmailSummaryResult = response.json().await?;
                log::info!(
                    "daily summary sent to {} ({} messages, email {})",
                    recipient,
                    result.message_count,
                    result.email_id
                );
            }
            Ok(response) => {
                let status = response.status();
                let detail = response.text().await.unwrap_or_default();
                log::error!("sending summary to {} failed with {}: {}", recipient, status, detail);
                failures += 1;
            }
            Err(err) => {
                log::error!("sending summary to {} failed: {}", recipient, err);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        log::error!("{} of {} summaries failed", failures, args.to.len());
        std::process::exit(1);
    }
    Ok(())
}
