//! Composition of channel summary emails.
//!
//! Turns a generated summary plus its reporting window into a ready-to-send
//! [`OutgoingEmail`]: subject line, plain-text body and (optionally) an HTML
//! body rendered from the summary's Markdown.

use std::borrow::Cow;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use pulldown_cmark::{Options, Parser, escape, html};
use regex::Regex;
use thiserror::Error;

use crate::mailer::OutgoingEmail;

const REPORT_TITLE: &str = "Discord Channel Summary";
const DATE_FORMAT: &str = "%Y-%m-%d";

static SINCE_REGEX: OnceLock<Regex> = OnceLock::new();
static MARKDOWN_FENCE_REGEX: OnceLock<Regex> = OnceLock::new();

/// Matches `<number><unit>` durations such as `24h`, `7 days` or `1.5h`.
fn since_regex() -> &'static Regex {
    SINCE_REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)^(-?(?:\d+)?\.?\d+) *(milliseconds?|msecs?|ms|seconds?|secs?|s|minutes?|mins?|m|hours?|hrs?|h|days?|d|weeks?|w|years?|yrs?|y)?$",
        )
        .expect("Invalid since regex")
    })
}

fn markdown_fence_regex() -> &'static Regex {
    MARKDOWN_FENCE_REGEX.get_or_init(|| {
        Regex::new(r"```markdown\n((?s:.*?))```").expect("Invalid markdown fence regex")
    })
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinceParseError {
    #[error("Time period (since) is required")]
    Empty,
    #[error("Invalid time period format '{0}'. Use values like \"24h\", \"1d\", \"7d\", etc.")]
    Invalid(String),
    #[error("Time period '{0}' must be greater than zero")]
    NonPositive(String),
    #[error("Time period '{0}' is too long")]
    OutOfRange(String),
}

/// Parse a human duration like `24h`, `2 days` or `90000` (milliseconds).
///
/// A number without a unit is taken as milliseconds. Years are 365.25 days.
pub fn parse_since(input: &str) -> Result<Duration, SinceParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SinceParseError::Empty);
    }
    if trimmed.len() > 100 {
        return Err(SinceParseError::Invalid(trimmed.to_string()));
    }

    let captures = since_regex()
        .captures(trimmed)
        .ok_or_else(|| SinceParseError::Invalid(trimmed.to_string()))?;

    let amount: f64 = captures[1]
        .parse()
        .map_err(|_| SinceParseError::Invalid(trimmed.to_string()))?;
    let unit = captures
        .get(2)
        .map(|unit| unit.as_str().to_ascii_lowercase())
        .unwrap_or_else(|| "ms".to_string());

    let unit_millis = match unit.as_str() {
        "years" | "year" | "yrs" | "yr" | "y" => 31_557_600_000.0,
        "weeks" | "week" | "w" => 604_800_000.0,
        "days" | "day" | "d" => 86_400_000.0,
        "hours" | "hour" | "hrs" | "hr" | "h" => 3_600_000.0,
        "minutes" | "minute" | "mins" | "min" | "m" => 60_000.0,
        "seconds" | "second" | "secs" | "sec" | "s" => 1_000.0,
        _ => 1.0,
    };

    let millis = (amount * unit_millis).round();
    if millis <= 0.0 {
        return Err(SinceParseError::NonPositive(trimmed.to_string()));
    }
    if millis >= i64::MAX as f64 {
        return Err(SinceParseError::OutOfRange(trimmed.to_string()));
    }

    Duration::try_milliseconds(millis as i64)
        .ok_or_else(|| SinceParseError::OutOfRange(trimmed.to_string()))
}

/// The `[end - period, end]` window, or an error when the start would fall
/// outside the representable calendar.
pub fn lookback_window(
    end: DateTime<Utc>,
    period: Duration,
    input: &str,
) -> Result<(DateTime<Utc>, DateTime<Utc>), SinceParseError> {
    end.checked_sub_signed(period)
        .map(|start| (start, end))
        .ok_or_else(|| SinceParseError::OutOfRange(input.trim().to_string()))
}

/// Body format requested for a summary email.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Html,
    Text,
}

impl ReportFormat {
    /// `html` (the default when absent) selects HTML; any other value sends text only.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => ReportFormat::Html,
            Some(value) if value.eq_ignore_ascii_case("html") => ReportFormat::Html,
            Some(_) => ReportFormat::Text,
        }
    }
}

/// Reporting window and volume shown alongside a summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestMetadata {
    pub channel_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub message_count: usize,
}

impl DigestMetadata {
    fn date_range(&self) -> (String, String) {
        (
            self.start.format(DATE_FORMAT).to_string(),
            self.end.format(DATE_FORMAT).to_string(),
        )
    }
}

pub fn summary_subject(metadata: &DigestMetadata) -> String {
    let (start, end) = metadata.date_range();
    format!("{REPORT_TITLE} ({start} to {end})")
}

pub fn render_text_body(
    summary: &str,
    metadata: &DigestMetadata,
    generated_on: DateTime<Utc>,
) -> String {
    let (start, end) = metadata.date_range();
    let body = format!(
        "{REPORT_TITLE}\n======================\n\nChannel ID: {}\nDate Range: {} to {}\nMessages Processed: {}\n\n{}\n\nGenerated on {}",
        metadata.channel_id,
        start,
        end,
        metadata.message_count,
        summary,
        generated_on.format(DATE_FORMAT)
    );
    body.trim().to_string()
}

/// Unwrap ```` ```markdown ```` fences that models sometimes put around their output.
pub fn strip_markdown_fence(summary: &str) -> Cow<'_, str> {
    if !summary.contains("```markdown") {
        return Cow::Borrowed(summary);
    }
    markdown_fence_regex().replace_all(summary, "$1")
}

pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut html_buf = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_buf, parser);
    html_buf
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    // Writing into a String is infallible.
    let _ = escape::escape_html(&mut escaped, value);
    escaped
}

const HTML_STYLE: &str = r#"    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, 'Open Sans', sans-serif;
      line-height: 1.6;
      color: #333;
      max-width: 800px;
      margin: 0 auto;
      padding: 20px;
      background-color: #f9f9f9;
    }
    header {
      text-align: center;
      margin-bottom: 20px;
    }
    h1 {
      color: #5865F2;
    }
    .metadata {
      background-color: #fff;
      border-radius: 8px;
      padding: 15px;
      margin-bottom: 20px;
      box-shadow: 0 1px 3px rgba(0,0,0,0.1);
    }
    .summary {
      background-color: #fff;
      border-radius: 8px;
      padding: 20px;
      box-shadow: 0 1px 3px rgba(0,0,0,0.1);
    }
    .summary img {
      max-width: 100%;
      height: auto;
    }
    footer {
      text-align: center;
      margin-top: 20px;
      font-size: 0.9rem;
      color: #666;
    }"#;

pub fn render_html_body(
    summary: &str,
    metadata: &DigestMetadata,
    generated_on: DateTime<Utc>,
) -> String {
    let content = render_markdown(&strip_markdown_fence(summary));
    let (start, end) = metadata.date_range();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>
{style}
  </style>
</head>
<body>
  <header>
    <h1>{title}</h1>
  </header>
  <div class="metadata">
    <p><strong>Channel ID:</strong> {channel}</p>
    <p><strong>Date Range:</strong> {start} to {end}</p>
    <p><strong>Messages Processed:</strong> {count}</p>
  </div>
  <div class="summary">
    {content}
  </div>
  <footer>
    <p>Generated on {generated}</p>
  </footer>
</body>
</html>"#,
        title = REPORT_TITLE,
        style = HTML_STYLE,
        channel = escape_html(&metadata.channel_id),
        start = start,
        end = end,
        count = metadata.message_count,
        content = content,
        generated = generated_on.format(DATE_FORMAT),
    )
}

/// Assemble the email for one recipient. The text body is always present.
pub fn compose_summary_email(
    to: &str,
    summary: &str,
    metadata: &DigestMetadata,
    format: ReportFormat,
    generated_on: DateTime<Utc>,
) -> OutgoingEmail {
    let html = match format {
        ReportFormat::Html => Some(render_html_body(summary, metadata, generated_on)),
        ReportFormat::Text => None,
    };

    OutgoingEmail {
        to: to.to_string(),
        subject: summary_subject(metadata),
        text: render_text_body(summary, metadata, generated_on),
        html,
    }
}
