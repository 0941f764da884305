use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use thiserror::Error;

/// Все исходы бронирования, кроме успеха.
///
/// `AlreadyBooked` - штатный результат гонки, а не сбой инфраструктуры;
/// только `StorageUnavailable` имеет смысл повторять.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("seat {0} not found")]
    SeatNotFound(String),

    #[error("seat {seat_id} is already booked for {date}")]
    AlreadyBooked { seat_id: String, date: NaiveDate },

    #[error("payment declined")]
    PaymentDeclined,

    #[error("confirmation could not be delivered: {0}")]
    NotificationFailure(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl BookingError {
    /// Machine-readable kind, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "ValidationError",
            BookingError::InvalidDate(_) => "InvalidDate",
            BookingError::SeatNotFound(_) => "SeatNotFound",
            BookingError::AlreadyBooked { .. } => "AlreadyBooked",
            BookingError::PaymentDeclined => "PaymentDeclined",
            BookingError::NotificationFailure(_) => "NotificationFailure",
            BookingError::StorageUnavailable(_) => "StorageUnavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::Validation(_) | BookingError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            BookingError::SeatNotFound(_) => StatusCode::NOT_FOUND,
            BookingError::AlreadyBooked { .. } => StatusCode::CONFLICT,
            BookingError::PaymentDeclined => StatusCode::PAYMENT_REQUIRED,
            // Уведомление шлётся после фиксации брони и только логируется;
            // в ответ эта ошибка попадает лишь при прямом вызове диспетчера.
            BookingError::NotificationFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BookingError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::StorageUnavailable(_))
    }
}

impl From<validator::ValidationErrors> for BookingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Собираем имена полей в стабильном порядке для сообщения клиенту
        let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort_unstable();
        BookingError::Validation(format!("invalid patron fields: {}", fields.join(", ")))
    }
}

impl From<sqlx::Error> for BookingError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("postgres error: {:?}", e);
        BookingError::StorageUnavailable(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for BookingError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        BookingError::StorageUnavailable(format!("migration failed: {e}"))
    }
}

impl From<redis::RedisError> for BookingError {
    fn from(e: redis::RedisError) -> Self {
        tracing::error!("redis error: {:?}", e);
        BookingError::StorageUnavailable(e.to_string())
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
            "retryable": self.is_retryable(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}
