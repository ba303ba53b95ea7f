use parking_lot::RwLock;

use super::{MessageFilter, MessageOrder, MessageQuery, MessageStore, StoreError};
use crate::models::Message;

/// Message store backed by a vector, used by tests and offline tooling.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageStore {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages: RwLock::new(messages),
        }
    }

    /// Insert or replace a message by id.
    pub fn upsert(&self, message: Message) {
        let mut messages = self.messages.write();
        match messages.iter_mut().find(|existing| existing.id == message.id) {
            Some(existing) => *existing = message,
            None => messages.push(message),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

#[rocket::async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn find_messages(&self, query: &MessageQuery) -> Result<Vec<Message>, StoreError> {
        let mut matched: Vec<Message> = self
            .messages
            .read()
            .iter()
            .filter(|message| query.filter.matches(message))
            .cloned()
            .collect();

        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        if query.order == MessageOrder::Descending {
            matched.reverse();
        }

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_messages(&self, filter: &MessageFilter) -> Result<i64, StoreError> {
        let count = self
            .messages
            .read()
            .iter()
            .filter(|message| filter.matches(message))
            .count();
        Ok(count as i64)
    }

    async fn find_message(&self, id: &str) -> Result<Option<Message>, StoreError> {
        Ok(self
            .messages
            .read()
            .iter()
            .find(|message| message.id == id)
            .cloned())
    }
}
