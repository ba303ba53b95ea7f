use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::FromRow;
use rocket_db_pools::sqlx::types::Json as SqlJson;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Deserializer, Serialize};

// ===== Message Models =====

/// File attached to a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

/// Rich embed (link preview, bot card) attached to a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Embed {
    #[serde(
        rename = "type",
        default = "default_embed_kind",
        deserialize_with = "embed_kind_or_default"
    )]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn default_embed_kind() -> String {
    "rich".to_string()
}

fn embed_kind_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_embed_kind))
}

/// Treats an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A chat message as archived from the monitored channel.
///
/// Only `id`, `content`, `author_username`, `created_at`, `thread_id`,
/// `reply_to_id`, `attachments` and `embeds` take part in threading and
/// rendering; the remaining fields are carried through for API consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub author_username: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub guild_name: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reply_to_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mentions_reply_target: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub embeds: Vec<Embed>,
}

impl Message {
    /// Minimal message with only the fields the renderer needs.
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Message {
            id: id.into(),
            content: String::new(),
            author_id: None,
            author_username: None,
            channel_id: None,
            channel_name: None,
            guild_id: None,
            guild_name: None,
            thread_id: None,
            parent_id: None,
            created_at,
            updated_at: None,
            reply_to_id: None,
            mentions_reply_target: false,
            attachments: Vec::new(),
            embeds: Vec::new(),
        }
    }

    /// Non-empty thread id, if any. Empty strings count as absent.
    pub fn thread_ref(&self) -> Option<&str> {
        self.thread_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Non-empty reply target, if any. Empty strings count as absent.
    pub fn reply_ref(&self) -> Option<&str> {
        self.reply_to_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Row shape of the `messages` table.
#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: String,
    pub content: String,
    pub author_id: Option<String>,
    pub author_username: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub guild_id: Option<String>,
    pub guild_name: Option<String>,
    pub thread_id: Option<String>,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub reply_to_id: Option<String>,
    pub mentions_reply_target: bool,
    pub attachments: SqlJson<Vec<Attachment>>,
    pub embeds: SqlJson<Vec<Embed>>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            content: row.content,
            author_id: row.author_id,
            author_username: row.author_username,
            channel_id: row.channel_id,
            channel_name: row.channel_name,
            guild_id: row.guild_id,
            guild_name: row.guild_name,
            thread_id: row.thread_id,
            parent_id: row.parent_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            reply_to_id: row.reply_to_id,
            mentions_reply_target: row.mentions_reply_target,
            attachments: row.attachments.0,
            embeds: row.embeds.0,
        }
    }
}

// ===== API Response Models =====

/// Pagination block returned alongside message listings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Pagination {
            page,
            limit,
            total,
            pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub pagination: Pagination,
}

/// Token accounting reported by the summarizer backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default, alias = "prompt_tokens")]
    pub prompt_tokens: u64,
    #[serde(default, alias = "completion_tokens")]
    pub completion_tokens: u64,
    #[serde(default, alias = "total_tokens")]
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptPreview {
    pub channel_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub message_count: usize,
    pub formatted_messages: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub channel_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub message_count: usize,
    pub summary: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailSummaryResult {
    pub success: bool,
    pub channel_id: String,
    pub to: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub message_count: usize,
    pub email_id: String,
}
