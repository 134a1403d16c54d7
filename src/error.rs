use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::blobstore::BlobError;
use crate::services::flutterwave::ProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error: {message}")]
    Upstream {
        message: String,
        detail: Option<serde_json::Value>,
    },

    #[error("Transaction not successful (status: {status})")]
    PaymentNotSuccessful { status: String },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(credential) => AppError::Configuration(format!(
                "Payment provider {} is not configured",
                credential
            )),
            ProviderError::Transport(e) => AppError::Upstream {
                message: "Payment provider request failed".to_string(),
                detail: Some(serde_json::Value::String(e.to_string())),
            },
            ProviderError::Api { status, detail } => AppError::Upstream {
                message: format!("Payment provider returned {}", status),
                detail: Some(detail),
            },
            ProviderError::MissingData(what) => AppError::Upstream {
                message: format!("Payment provider response missing {}", what),
                detail: None,
            },
        }
    }
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::NotConfigured => {
                AppError::Configuration("Blob signing secret is not configured".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            success: bool,
            message: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            detail: Option<serde_json::Value>,
        }

        let (status, message, detail) = match self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::Configuration(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
            AppError::Upstream { message, detail } => {
                tracing::error!(message = %message, detail = ?detail, "Upstream call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message, detail)
            }
            AppError::PaymentNotSuccessful { status } => (
                StatusCode::BAD_REQUEST,
                format!("Transaction not successful (status: {})", status),
                None,
            ),
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "Unhandled internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                message,
                detail,
            }),
        )
            .into_response()
    }
}
