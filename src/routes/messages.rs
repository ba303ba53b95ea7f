//! Message browsing endpoints.
//!
//! Listings are paginated and come back either as JSON records with a
//! pagination block or, with `format=txt`, as a plain-text transcript of the
//! requested page.

use rocket::response::content::RawText;
use rocket::{Responder, State, get, serde::json::Json};
use rocket_okapi::OpenApiError;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{RefOr, Responses};
use rocket_okapi::openapi;
use rocket_okapi::response::OpenApiResponderInner;

use crate::error::ApiError;
use crate::models::{Message, MessagePage, Pagination};
use crate::routes::params::{MessageListParams, ThreadMessageParams};
use crate::store::{MessageFilter, MessageOrder, MessageQuery, MessageStore, SharedMessageStore};
use crate::threading::{FormattedMessages, OutputFormat, format_messages};

/// A page of messages, as records or as a transcript.
#[derive(Debug, Responder)]
pub enum MessageListResponse {
    Transcript(RawText<String>),
    Page(Json<MessagePage>),
}

impl OpenApiResponderInner for MessageListResponse {
    fn responses(generator: &mut OpenApiGenerator) -> Result<Responses, OpenApiError> {
        let mut responses = Json::<MessagePage>::responses(generator)?;
        let transcript = RawText::<String>::responses(generator)?;

        for (code, extra) in transcript.responses {
            if let RefOr::Object(extra) = extra {
                if let Some(RefOr::Object(existing)) = responses.responses.get_mut(&code) {
                    existing.content.extend(extra.content);
                    continue;
                }
                responses.responses.insert(code, RefOr::Object(extra));
            }
        }

        Ok(responses)
    }
}

async fn fetch_page(
    store: &dyn MessageStore,
    filter: MessageFilter,
    order: MessageOrder,
    page: i64,
    limit: i64,
    format: OutputFormat,
) -> Result<MessageListResponse, ApiError> {
    let query = MessageQuery::new(filter, order).page(page as u64, limit as u64);
    let messages = store.find_messages(&query).await?;

    match format_messages(messages, format) {
        FormattedMessages::Text(transcript) => {
            Ok(MessageListResponse::Transcript(RawText(transcript)))
        }
        FormattedMessages::Records(messages) => {
            let total = store.count_messages(&query.filter).await?;
            Ok(MessageListResponse::Page(Json(MessagePage {
                messages,
                pagination: Pagination::new(page, limit, total),
            })))
        }
    }
}

/// List messages, newest first, with optional guild/channel/author/date filters.
#[openapi(tag = "Messages")]
#[get("/messages?<params..>")]
pub async fn list_messages(
    params: MessageListParams,
    store: &State<SharedMessageStore>,
) -> Result<MessageListResponse, ApiError> {
    let filter = params.filter()?;
    fetch_page(
        store.inner().as_ref(),
        filter,
        MessageOrder::Descending,
        params.page(),
        params.limit(),
        params.format,
    )
    .await
}

/// Retrieve a single message by its identifier.
#[openapi(tag = "Messages")]
#[get("/messages/<id>")]
pub async fn get_message(
    id: String,
    store: &State<SharedMessageStore>,
) -> Result<Json<Message>, ApiError> {
    store
        .find_message(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))
}

/// List the messages of one thread in chronological order.
#[openapi(tag = "Messages")]
#[get("/messages/thread/<thread_id>?<params..>")]
pub async fn get_thread_messages(
    thread_id: String,
    params: ThreadMessageParams,
    store: &State<SharedMessageStore>,
) -> Result<MessageListResponse, ApiError> {
    fetch_page(
        store.inner().as_ref(),
        MessageFilter::thread(thread_id),
        MessageOrder::Ascending,
        params.page(),
        params.limit(),
        params.format,
    )
    .await
}
