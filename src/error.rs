use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ApiResponse;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient tickets: need {required}, have {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("No characters available")]
    NoCharactersAvailable,

    #[error("Timed out waiting for transaction lock after {0} ms")]
    LockTimeout(u64),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, message) = match self {
            AppError::InvalidInput(msg) => {
                log::warn!("Invalid input: {msg}");
                (actix_web::http::StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::NotFound(_) => (actix_web::http::StatusCode::NOT_FOUND, self.to_string()),
            AppError::InsufficientFunds { .. } => {
                log::warn!("{self}");
                (actix_web::http::StatusCode::CONFLICT, self.to_string())
            }
            AppError::NoCharactersAvailable => {
                log::warn!("Draw rejected: character pool is empty");
                (actix_web::http::StatusCode::CONFLICT, self.to_string())
            }
            AppError::LockTimeout(_) => {
                log::warn!("{self}");
                (
                    actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
                    "Server busy, please retry".to_string(),
                )
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::StorageError(msg) => {
                log::error!("Storage error: {msg}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(ApiResponse::<()>::error(message))
    }
}
