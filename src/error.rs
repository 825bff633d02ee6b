use crate::domain::{Decimal, OrderId, OrderStatus};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// A user command the simulator refused. Rejections never leave partial state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },
    #[error("Insufficient holdings: requested {requested}, held {held}")]
    InsufficientHoldings { requested: Decimal, held: Decimal },
    #[error("Amount must be greater than zero")]
    InvalidAmount,
    #[error("Price must be greater than zero")]
    InvalidPrice,
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),
    #[error("Order {id} is {status} and can no longer be cancelled")]
    OrderNotCancellable { id: OrderId, status: OrderStatus },
    #[error("Order {id} is {status}, not an open trade")]
    OrderNotOpen { id: OrderId, status: OrderStatus },
    #[error("Terminal is not running")]
    TerminalUnavailable,
}

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Unknown broker: {0}")]
    UnknownBroker(String),
    #[error("Name must not be empty")]
    EmptyName,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    Rejected(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::UnknownInstrument(_) | CommandError::OrderNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            CommandError::TerminalUnavailable => AppError::Internal(err.to_string()),
            other => AppError::Rejected(other.to_string()),
        }
    }
}

impl From<PreferencesError> for AppError {
    fn from(err: PreferencesError) -> Self {
        match err {
            PreferencesError::UnknownBroker(_) | PreferencesError::EmptyName => {
                AppError::BadRequest(err.to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Rejected(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
