use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Insufficient stock for product {0}")]
    InsufficientStock(Uuid),

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Order is not completed")]
    OrderNotCompleted,

    #[error("Order already delivered")]
    AlreadyDelivered,

    #[error("Ticket is already closed")]
    TicketClosed,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not Found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable identifier exposed to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InsufficientStock(_) => "insufficient_stock",
            AppError::InsufficientBalance => "insufficient_balance",
            AppError::InvalidAmount => "invalid_amount",
            AppError::OrderNotCompleted => "order_not_completed",
            AppError::AlreadyDelivered => "already_delivered",
            AppError::TicketClosed => "ticket_closed",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::NotFound => "not_found",
            AppError::Validation(_) => "validation",
            AppError::BadRequest(_) => "bad_request",
            AppError::Timeout => "timeout",
            AppError::OrmError(_) | AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InsufficientStock(_) => StatusCode::CONFLICT,
            AppError::InsufficientBalance => StatusCode::PAYMENT_REQUIRED,
            AppError::InvalidAmount | AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::OrderNotCompleted
            | AppError::AlreadyDelivered
            | AppError::TicketClosed
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::OrmError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    kind: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::OrmError(err) => tracing::error!(error = %err, "database error"),
            AppError::Internal(err) => tracing::error!(error = %err, "internal error"),
            _ => {}
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                kind: self.kind(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
