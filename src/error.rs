// src/error.rs

use super::registry::Subject;
use actix_web::{HttpRequest, HttpResponse, ResponseError, error::JsonPayloadError, http::StatusCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("No message provided")]
    InvalidInput,

    /// Unknown subject, or a subject whose model failed to load.
    #[error("{} model not loaded", capitalize(.0))]
    ModelUnavailable(String),

    #[error("Error processing your {0} question")]
    Prediction(Subject),

    #[error("{0}")]
    Internal(String),
}

// Allow Actix to convert our custom error into an HTTP response
impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidInput => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

/// Routes body extraction failures (bad JSON, wrong content type) through
/// `ServiceError` so they share the `{ "error": ... }` shape.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ServiceError::Internal(err.to_string()).into()
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
