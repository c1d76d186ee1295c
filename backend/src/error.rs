//! Error handling for the Labelworks backend
//!
//! Store and reconciliation errors are typed; `AppError` turns them into
//! consistent JSON error responses.

use std::fmt;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::stores::StoreError;

/// Source data read by a recompute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStep {
    Materials,
    PurchaseOrders,
    LengthAdjustments,
}

impl fmt::Display for LoadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStep::Materials => write!(f, "materials"),
            LoadStep::PurchaseOrders => write!(f, "purchase orders"),
            LoadStep::LengthAdjustments => write!(f, "length adjustments"),
        }
    }
}

/// Inventory reconciliation failures
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Reading source data failed; nothing was written
    #[error("Failed to load {step}: {source}")]
    SourceLoad {
        step: LoadStep,
        #[source]
        source: StoreError,
    },

    /// The bulk snapshot write failed
    #[error("Failed to write inventory snapshots: {0}")]
    PersistenceWrite(#[source] StoreError),

    #[error("Inventory recompute exceeded {0:?}")]
    Timeout(Duration),
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn validation(field: &str, message: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::Inventory(InventoryError::SourceLoad { step, .. }) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "INVENTORY_SOURCE_UNAVAILABLE".to_string(),
                    message: format!("Could not load {} for inventory recompute", step),
                    field: None,
                },
            ),
            AppError::Inventory(InventoryError::PersistenceWrite(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INVENTORY_WRITE_FAILED".to_string(),
                    message: "Inventory snapshots could not be saved".to_string(),
                    field: None,
                },
            ),
            AppError::Inventory(InventoryError::Timeout(limit)) => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorDetail {
                    code: "INVENTORY_TIMEOUT".to_string(),
                    message: format!("Inventory recompute exceeded {}s", limit.as_secs()),
                    field: None,
                },
            ),
            AppError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
