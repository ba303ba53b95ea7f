//! Shared helper functions for Rocket route handlers.

use chrono::{DateTime, Utc};

use crate::error::ApiError;
use crate::models::Message;
use crate::store::{MessageFilter, MessageOrder, MessageQuery, MessageStore};

pub(crate) const NO_MESSAGES_IN_WINDOW: &str =
    "No messages found for the specified channel and time range";

/// Load a channel's messages in `[start, end]`, oldest first.
///
/// Returns [`ApiError::NotFound`] when the window is empty.
pub async fn load_channel_window(
    store: &dyn MessageStore,
    channel_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Message>, ApiError> {
    let query = MessageQuery::new(
        MessageFilter::channel(channel_id).between(start, end),
        MessageOrder::Ascending,
    );
    let messages = store.find_messages(&query).await?;

    if messages.is_empty() {
        return Err(ApiError::NotFound(NO_MESSAGES_IN_WINDOW.to_string()));
    }

    log::debug!(
        "loaded {} messages for channel {} between {} and {}",
        messages.len(),
        channel_id,
        start,
        end
    );
    Ok(messages)
}
