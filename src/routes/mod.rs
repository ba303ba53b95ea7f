//! HTTP route handlers grouped by resource.
//!
//! Each submodule exposes typed Rocket handlers annotated with `#[openapi]`
//! so `rocket_okapi` can derive the OpenAPI document automatically. Handlers
//! reach their collaborators (message store, summarizer, email transport)
//! through Rocket managed state.

pub mod email_summary;
pub mod health;
pub(crate) mod helpers;
pub mod messages;
pub mod params;
pub mod summarize;
