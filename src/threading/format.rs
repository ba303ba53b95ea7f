//! Output format dispatch
//!
//! Chooses between raw records and a rendered transcript, and between the
//! flat and threaded rendering strategies based on the size of the input.

use std::convert::Infallible;
use std::str::FromStr;

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

use super::index::build_index;
use super::render::{render_flat, render_threaded};
use crate::models::Message;

/// Inputs with at most this many messages are rendered flat.
pub const FLAT_RENDER_THRESHOLD: usize = 50;

/// Output representation requested by a caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured records, passed through unchanged.
    #[default]
    Json,
    /// Plain-text transcript.
    Txt,
}

impl OutputFormat {
    /// Case-insensitive parse; anything other than `txt` means `json`.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("txt") {
            OutputFormat::Txt
        } else {
            OutputFormat::Json
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(OutputFormat::parse(value))
    }
}

/// Result of [`format_messages`].
#[derive(Debug, Clone, PartialEq)]
pub enum FormattedMessages {
    Text(String),
    Records(Vec<Message>),
}

impl FormattedMessages {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormattedMessages::Text(text) => Some(text),
            FormattedMessages::Records(_) => None,
        }
    }

    pub fn into_records(self) -> Option<Vec<Message>> {
        match self {
            FormattedMessages::Records(records) => Some(records),
            FormattedMessages::Text(_) => None,
        }
    }
}

/// Render a transcript, flat for small inputs and threaded otherwise.
///
/// Callers supply messages pre-sorted (chronological ascending for
/// summaries); the flat strategy keeps that order verbatim.
pub fn render_transcript(messages: &[Message]) -> String {
    render_transcript_with_threshold(messages, FLAT_RENDER_THRESHOLD)
}

pub fn render_transcript_with_threshold(messages: &[Message], flat_threshold: usize) -> String {
    if messages.len() <= flat_threshold {
        render_flat(messages)
    } else {
        render_threaded(&build_index(messages))
    }
}

/// Format a message set for the requested output.
///
/// Empty input yields an empty transcript or an empty record list, never an
/// error.
pub fn format_messages(messages: Vec<Message>, format: OutputFormat) -> FormattedMessages {
    match format {
        OutputFormat::Txt => FormattedMessages::Text(render_transcript(&messages)),
        OutputFormat::Json => FormattedMessages::Records(messages),
    }
}
