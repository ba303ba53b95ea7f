//! Query parameter helpers shared by the message and summary handlers.
//!
//! The structs derive `FromForm` for Rocket and `JsonSchema` so the generated
//! OpenAPI document lists every parameter with its default. Dates are kept as
//! raw strings here and parsed by the handlers, so that a malformed date is
//! reported as a 400 with a readable message instead of a form error.

use chrono::{DateTime, NaiveTime, Utc};
use rocket::form::{self, FromFormField, ValueField};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::store::MessageFilter;
use crate::threading::OutputFormat;

const fn default_page() -> i64 {
    1
}

const fn default_limit() -> i64 {
    50
}

const fn default_format() -> OutputFormat {
    OutputFormat::Json
}

/// Upper bound for a single page of messages.
pub const MAX_PAGE_LIMIT: i64 = 5000;

impl<'r> FromFormField<'r> for OutputFormat {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        Ok(OutputFormat::parse(field.value))
    }
}

/// Parse a user supplied date or timestamp.
///
/// Accepts anything `dateparser` understands: RFC 3339, RFC 2822,
/// `YYYY-MM-DD`, unix timestamps and more. Naive values are taken as UTC and
/// bare dates as midnight.
pub fn parse_date(name: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    dateparser::parse_with(value.trim(), &Utc, NaiveTime::default()).map_err(|_| {
        ApiError::BadRequest(format!("invalid {name} '{value}', expected a date or timestamp"))
    })
}

fn parse_optional_date(
    name: &str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(name, value).map(Some),
    }
}

fn clamp_page(page: i64) -> i64 {
    page.max(1)
}

fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_PAGE_LIMIT)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Query parameters accepted by the message listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, rocket::form::FromForm, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageListParams {
    /// Only messages from this guild.
    #[field(name = "guildId")]
    pub guild_id: Option<String>,
    /// Only messages from this channel.
    #[field(name = "channelId")]
    pub channel_id: Option<String>,
    /// Only messages by this author.
    #[field(name = "authorId")]
    pub author_id: Option<String>,
    /// Inclusive lower bound on creation time.
    #[field(name = "startDate")]
    pub start_date: Option<String>,
    /// Inclusive upper bound on creation time.
    #[field(name = "endDate")]
    pub end_date: Option<String>,
    /// One-based page index (defaults to 1).
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// Messages per page (defaults to 50, clamped to 1..=5000).
    #[field(default = 50)]
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// `txt` for a plain-text transcript; anything else returns JSON.
    #[field(default = OutputFormat::Json)]
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

impl Default for MessageListParams {
    fn default() -> Self {
        Self {
            guild_id: None,
            channel_id: None,
            author_id: None,
            start_date: None,
            end_date: None,
            page: default_page(),
            limit: default_limit(),
            format: default_format(),
        }
    }
}

impl MessageListParams {
    pub fn page(&self) -> i64 {
        clamp_page(self.page)
    }

    pub fn limit(&self) -> i64 {
        clamp_limit(self.limit)
    }

    /// Build the store filter, rejecting unparseable dates.
    pub fn filter(&self) -> Result<MessageFilter, ApiError> {
        Ok(MessageFilter {
            guild_id: non_empty(&self.guild_id),
            channel_id: non_empty(&self.channel_id),
            author_id: non_empty(&self.author_id),
            thread_id: None,
            start: parse_optional_date("startDate", self.start_date.as_deref())?,
            end: parse_optional_date("endDate", self.end_date.as_deref())?,
        })
    }
}

/// Pagination and format parameters for the thread endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, rocket::form::FromForm, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreadMessageParams {
    /// One-based page index (defaults to 1).
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// Messages per page (defaults to 50, clamped to 1..=5000).
    #[field(default = 50)]
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// `txt` for a plain-text transcript; anything else returns JSON.
    #[field(default = OutputFormat::Json)]
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

impl Default for ThreadMessageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            format: default_format(),
        }
    }
}

impl ThreadMessageParams {
    pub fn page(&self) -> i64 {
        clamp_page(self.page)
    }

    pub fn limit(&self) -> i64 {
        clamp_limit(self.limit)
    }
}

/// Reporting window shared by the summary endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, rocket::form::FromForm, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryWindowParams {
    /// Inclusive start of the window (required).
    #[field(name = "startDate")]
    pub start_date: Option<String>,
    /// Inclusive end of the window (required).
    #[field(name = "endDate")]
    pub end_date: Option<String>,
    /// Model override for the summarizer.
    pub model: Option<String>,
    /// Completion token budget override.
    #[field(name = "maxTokens")]
    pub max_tokens: Option<u32>,
}

impl SummaryWindowParams {
    /// Both bounds, parsed. Missing or malformed dates are a bad request.
    pub fn window(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
        let start = non_empty(&self.start_date);
        let end = non_empty(&self.end_date);
        match (start, end) {
            (Some(start), Some(end)) => Ok((
                parse_date("startDate", &start)?,
                parse_date("endDate", &end)?,
            )),
            _ => Err(ApiError::BadRequest(
                "startDate and endDate query parameters are required".to_string(),
            )),
        }
    }

    pub fn model(&self) -> Option<String> {
        non_empty(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn limit_is_clamped() {
        let mut params = MessageListParams::default();
        assert_eq!(params.limit(), 50);
        params.limit = 0;
        assert_eq!(params.limit(), 1);
        params.limit = 100_000;
        assert_eq!(params.limit(), MAX_PAGE_LIMIT);
        params.page = -3;
        assert_eq!(params.page(), 1);
    }

    #[test]
    fn dates_accept_common_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 4, 3, 0, 0, 0).unwrap();
        assert_eq!(parse_date("startDate", "2025-04-03").unwrap(), expected);
        assert_eq!(
            parse_date("startDate", "2025-04-03T00:00:00Z").unwrap(),
            expected
        );
        assert!(matches!(
            parse_date("startDate", "not a date"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn filter_ignores_blank_values() {
        let params = MessageListParams {
            channel_id: Some("general".to_string()),
            guild_id: Some("  ".to_string()),
            start_date: Some(String::new()),
            ..Default::default()
        };
        let filter = params.filter().unwrap();
        assert_eq!(filter.channel_id.as_deref(), Some("general"));
        assert!(filter.guild_id.is_none());
        assert!(filter.start.is_none());
    }

    #[test]
    fn window_requires_both_dates() {
        let params = SummaryWindowParams {
            start_date: Some("2025-04-01".to_string()),
            ..Default::default()
        };
        match params.window() {
            Err(ApiError::BadRequest(message)) => {
                assert_eq!(message, "startDate and endDate query parameters are required")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
