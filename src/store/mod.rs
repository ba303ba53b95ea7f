//! Message store: read access to archived chat messages.
//!
//! Routes and the digest pipeline only see the [`MessageStore`] trait; the
//! service runs against [`PgMessageStore`], tests and the CLI against
//! [`InMemoryMessageStore`].

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx;
use thiserror::Error;

use crate::models::Message;

pub use memory::InMemoryMessageStore;
pub use postgres::{PgMessageStore, run_migrations};

/// Errors raised by message store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Chronological ordering of query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageOrder {
    #[default]
    Ascending,
    Descending,
}

impl MessageOrder {
    pub fn sql_keyword(self) -> &'static str {
        match self {
            MessageOrder::Ascending => "ASC",
            MessageOrder::Descending => "DESC",
        }
    }
}

/// Filters applied to message lookups. Unset fields match everything; the
/// time range is inclusive on both ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageFilter {
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
    pub author_id: Option<String>,
    pub thread_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl MessageFilter {
    pub fn channel(channel_id: impl Into<String>) -> Self {
        MessageFilter {
            channel_id: Some(channel_id.into()),
            ..Default::default()
        }
    }

    pub fn thread(thread_id: impl Into<String>) -> Self {
        MessageFilter {
            thread_id: Some(thread_id.into()),
            ..Default::default()
        }
    }

    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn matches(&self, message: &Message) -> bool {
        fn field_matches(expected: &Option<String>, actual: &Option<String>) -> bool {
            match expected {
                Some(expected) => actual.as_deref() == Some(expected.as_str()),
                None => true,
            }
        }

        field_matches(&self.guild_id, &message.guild_id)
            && field_matches(&self.channel_id, &message.channel_id)
            && field_matches(&self.author_id, &message.author_id)
            && field_matches(&self.thread_id, &message.thread_id)
            && self.start.is_none_or(|start| message.created_at >= start)
            && self.end.is_none_or(|end| message.created_at <= end)
    }
}

/// A filtered, ordered and optionally paginated lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageQuery {
    pub filter: MessageFilter,
    pub order: MessageOrder,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl MessageQuery {
    pub fn new(filter: MessageFilter, order: MessageOrder) -> Self {
        MessageQuery {
            filter,
            order,
            offset: 0,
            limit: None,
        }
    }

    /// Restrict to one 1-based page of `limit` messages.
    pub fn page(mut self, page: u64, limit: u64) -> Self {
        self.offset = page.saturating_sub(1).saturating_mul(limit);
        self.limit = Some(limit);
        self
    }
}

/// Read-only access to archived messages.
#[rocket::async_trait]
pub trait MessageStore: Send + Sync {
    async fn find_messages(&self, query: &MessageQuery) -> Result<Vec<Message>, StoreError>;

    async fn count_messages(&self, filter: &MessageFilter) -> Result<i64, StoreError>;

    async fn find_message(&self, id: &str) -> Result<Option<Message>, StoreError>;
}

/// Store handle kept in Rocket managed state.
pub type SharedMessageStore = Arc<dyn MessageStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn page_offsets_are_one_based() {
        let query = MessageQuery::default().page(3, 50);
        assert_eq!(query.offset, 100);
        assert_eq!(query.limit, Some(50));

        let first = MessageQuery::default().page(0, 50);
        assert_eq!(first.offset, 0);
    }

    #[test]
    fn filter_range_is_inclusive() {
        let start = Utc.with_ymd_and_hms(2025, 4, 3, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 4, 4, 0, 0, 0).unwrap();
        let filter = MessageFilter::channel("general").between(start, end);

        let mut message = Message::new("1", start);
        message.channel_id = Some("general".to_string());
        assert!(filter.matches(&message));

        message.created_at = end;
        assert!(filter.matches(&message));

        message.created_at = end + chrono::Duration::seconds(1);
        assert!(!filter.matches(&message));

        message.created_at = start;
        message.channel_id = Some("random".to_string());
        assert!(!filter.matches(&message));
    }
}
