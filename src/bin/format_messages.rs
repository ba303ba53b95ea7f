use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use channel_digest::models::Message;
use channel_digest::threading::{build_index, render_threaded, render_transcript};

#[derive(Parser, Debug)]
#[command(
    name = "format_messages",
    about = "Render archived chat messages as a threaded text transcript"
)]
struct Args {
    /// JSON file holding a message array or a `{"messages": [...]}` page. Use `-` for stdin.
    #[arg(conflicts_with = "api_url")]
    input: Option<PathBuf>,

    /// Base URL of a running API server to fetch messages from instead of a file.
    #[arg(long)]
    api_url: Option<String>,

    /// Only fetch messages from this channel.
    #[arg(long, requires = "api_url")]
    channel: Option<String>,

    /// Inclusive lower bound passed to the API as `startDate`.
    #[arg(long, requires = "api_url")]
    start_date: Option<String>,

    /// Inclusive upper bound passed to the API as `endDate`.
    #[arg(long, requires = "api_url")]
    end_date: Option<String>,

    /// Maximum number of messages to fetch.
    #[arg(long, default_value_t = 5000)]
    limit: u32,

    /// Always use the threaded layout, even for small inputs.
    #[arg(long)]
    threaded: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageInput {
    List(Vec<Message>),
    Page { messages: Vec<Message> },
}

impl MessageInput {
    fn into_messages(self) -> Vec<Message> {
        match self {
            MessageInput::List(messages) | MessageInput::Page { messages } => messages,
        }
    }
}

async fn fetch_messages(api_url: &str, args: &Args) -> Result<Vec<Message>, Box<dyn std::error::Error>> {
    let mut query: Vec<(&str, String)> = vec![("limit", args.limit.to_string())];
    if let Some(channel) = &args.channel {
        query.push(("channelId", channel.clone()));
    }
    if let Some(start) = &args.start_date {
        query.push(("startDate", start.clone()));
    }
    if let Some(end) = &args.end_date {
        query.push(("endDate", end.clone()));
    }

    let url = format!("{}/api/v1/messages", api_url.trim_end_matches('/'));
    log::info!("fetching messages from {}", url);

    let response = reqwest::Client::new()
        .get(&url)
        .query(&query)
        .send()
        .await?
        .error_for_status()?;
    let input: MessageInput = response.json().await?;
    Ok(input.into_messages())
}

fn read_messages(path: Option<&PathBuf>) -> Result<Vec<Message>, Box<dyn std::error::Error>> {
    let raw = match path {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)?,
        _ => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let input: MessageInput = serde_json::from_str(&raw)?;
    Ok(input.into_messages())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    let mut messages = match &args.api_url {
        Some(api_url) => fetch_messages(api_url, &args).await?,
        None => read_messages(args.input.as_ref())?,
    };
    // The listing endpoint returns newest first; transcripts read oldest first.
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    log::info!("formatting {} messages", messages.len());

    let transcript = if args.threaded {
        render_threaded(&build_index(&messages))
    } else {
        render_transcript(&messages)
    };

    let mut stdout = io::stdout().lock();
    stdout.write_all(transcript.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
