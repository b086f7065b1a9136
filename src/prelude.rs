use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("you must be logged in to perform this action")]
    Unauthorized,
    #[error("invalid input: {}", .0.join(", "))]
    BadInput(Vec<String>),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote procedure failed with {status}: {body}")]
    Remote { status: u16, body: String },
}

impl Error {
    pub fn bad_input(field: &str) -> Self {
        Error::BadInput(vec![field.to_string()])
    }

    fn code(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Error::BadInput(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("json body rejected: {}", rejection.body_text());
        Error::BadInput(vec![rejected_field(&rejection.body_text(), "target type: ")])
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("query string rejected: {}", rejection.body_text());
        Error::BadInput(vec![rejected_field(&rejection.body_text(), "query string: ")])
    }
}

/// Field named by the serde path in an extractor rejection. Falls back to
/// `body` when the payload can't be pinned on one field.
fn rejected_field(detail: &str, marker: &str) -> String {
    detail
        .split_once(marker)
        .and_then(|(_, rest)| rest.split_once(": "))
        .map(|(path, _)| path)
        .filter(|path| !path.is_empty() && !path.contains(char::is_whitespace))
        .unwrap_or("body")
        .to_string()
}

/// Names of the fields rejected by a `validator` pass, sorted so callers can
/// append their own checks and still report a stable list.
pub fn invalid_fields(outcome: std::result::Result<(), ValidationErrors>) -> Vec<String> {
    match outcome {
        Ok(()) => Vec::new(),
        Err(errors) => {
            let mut fields: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|field| field.to_string())
                .collect();
            fields.sort();
            fields
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = self.code();
        let body = match &self {
            Error::BadInput(fields) => json!({
                "error": { "code": code, "message": self.to_string(), "fields": fields }
            }),
            Error::Unauthorized => json!({
                "error": { "code": code, "message": self.to_string() }
            }),
            _ => {
                tracing::error!("request failed: {}", &self);
                json!({
                    "error": { "code": code, "message": "internal server error" }
                })
            }
        };
        (status, Json(body)).into_response()
    }
}
