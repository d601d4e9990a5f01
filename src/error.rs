use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::payment::{webhook::WebhookError, PaymentError};
use crate::pricing::PricingError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Payment gateway error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Database error: {0}")]
    Db(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::Db(DbErr::RecordNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Payment(_) => StatusCode::BAD_GATEWAY,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Db(DbErr::RecordNotFound(what)) => format!("{what} not found"),
            AppError::Db(_) | AppError::Internal(_) => {
                error!(error = %self, "request failed");
                "Internal server error".to_owned()
            }
            AppError::Payment(_) => {
                error!(error = %self, "payment gateway call failed");
                self.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
