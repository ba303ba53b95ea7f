//! Liveness check for load balancers and the daily digest cron.
//!
//! Answers without touching the message store or either upstream API, so a
//! missing OpenAI or Mailgun key never fails the check.

use rocket::serde::json::Json;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

const STATUS_OK: &str = "ok";

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    /// Always `ok` while the process is serving requests.
    pub status: String,
}

impl HealthResponse {
    fn ok() -> Self {
        Self {
            status: STATUS_OK.to_string(),
        }
    }
}

/// Report that the digest service is up.
#[openapi(tag = "Health")]
#[get("/health")]
pub fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
