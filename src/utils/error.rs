use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Missing, malformed or expired bearer token
    Unauthorized,
    /// Authenticated, but not allowed to touch the resource
    Forbidden,
    InvalidRequest(String),
    NotFound(String),
    /// The referenced test has no slots left
    CapacityExceeded(String),
    Conflict(String),
    PaymentError(String),
    DatabaseError(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Unauthorized => write!(f, "Unauthorized Access"),
            AppError::Forbidden => write!(f, "Forbidden Access"),
            AppError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::CapacityExceeded(msg) => write!(f, "Capacity exceeded: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::PaymentError(msg) => write!(f, "Payment processor error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::CapacityExceeded(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PaymentError(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Unauthorized | AppError::Forbidden => json!({
                "message": self.to_string(),
            }),
            // Store internals stay in the logs
            AppError::DatabaseError(_) | AppError::Internal(_) => json!({
                "message": "Internal server error",
            }),
            _ => json!({
                "message": self.to_string(),
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        // 11000 = duplicate key
        if let ErrorKind::Write(WriteFailure::WriteError(ref write_error)) = *err.kind {
            if write_error.code == 11000 {
                return AppError::Conflict(write_error.message.clone());
            }
        }
        AppError::DatabaseError(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InvalidRequest(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for AppError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        log::debug!("🔑 Token rejected: {}", err);
        AppError::Unauthorized
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::PaymentError(err.to_string())
    }
}
