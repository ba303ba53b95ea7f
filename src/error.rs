use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse, Responses};
use rocket_okapi::okapi::Map;
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::OpenApiError;
use serde::Serialize;
use std::io::Cursor;

use crate::digest::SinceParseError;
use crate::mailer::DeliveryError;
use crate::store::StoreError;
use crate::summarizer::SummarizerError;

#[derive(Debug)]
pub enum ApiError {
    DatabaseError(StoreError),
    SummarizerError(SummarizerError),
    DeliveryError(DeliveryError),
    NotFound(String),
    BadRequest(String),
    InternalError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let (status, error_type, message) = match self {
            ApiError::DatabaseError(e) => {
                log::error!("database error: {}", e);
                (Status::InternalServerError, "DatabaseError", e.to_string())
            }
            ApiError::SummarizerError(SummarizerError::NotConfigured(reason)) => {
                log::error!("summarizer unavailable: {}", reason);
                (
                    Status::InternalServerError,
                    "InternalError",
                    format!("summarizer is not configured: {reason}"),
                )
            }
            ApiError::SummarizerError(e) => {
                log::error!("summarizer error: {}", e);
                (Status::BadGateway, "SummarizerError", e.to_string())
            }
            ApiError::DeliveryError(DeliveryError::NotConfigured(reason)) => {
                log::error!("email transport unavailable: {}", reason);
                (
                    Status::InternalServerError,
                    "InternalError",
                    format!("email transport is not configured: {reason}"),
                )
            }
            ApiError::DeliveryError(e) => {
                log::error!("delivery error: {}", e);
                (Status::BadGateway, "DeliveryError", e.to_string())
            }
            ApiError::NotFound(msg) => {
                log::debug!("not found: {}", msg);
                (Status::NotFound, "NotFound", msg)
            }
            ApiError::BadRequest(msg) => {
                log::debug!("bad request: {}", msg);
                (Status::BadRequest, "BadRequest", msg)
            }
            ApiError::InternalError(msg) => {
                log::error!("internal error: {}", msg);
                (Status::InternalServerError, "InternalError", msg)
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        let json = serde_json::to_string(&error_response).unwrap_or_else(|_| {
            r#"{"error":"SerializationError","message":"Failed to serialize error"}"#.to_string()
        });

        Response::build()
            .status(status)
            .header(rocket::http::ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(_generator: &mut OpenApiGenerator) -> Result<Responses, OpenApiError> {
        let documented = [
            ("400", "Invalid or missing request parameters."),
            ("404", "No matching messages were found."),
            ("500", "Database failure or an unconfigured collaborator."),
            ("502", "The summarizer or email transport failed."),
        ];

        let mut responses = Map::new();
        for (code, description) in documented {
            responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }

        Ok(Responses {
            responses,
            ..Default::default()
        })
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<SummarizerError> for ApiError {
    fn from(err: SummarizerError) -> Self {
        ApiError::SummarizerError(err)
    }
}

impl From<DeliveryError> for ApiError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::MissingRecipient
            | DeliveryError::MissingSubject
            | DeliveryError::MissingBody => ApiError::BadRequest(err.to_string()),
            other => ApiError::DeliveryError(other),
        }
    }
}

impl From<SinceParseError> for ApiError {
    fn from(err: SinceParseError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
