use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::BookingError,
    models::{Booking, Patron, PaymentDetails},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/bookings", post(create_booking))
}

/* ---------- BOOKINGS ---------- */

// Пустые поля доходят до валидации и получают осмысленную ошибку
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub seat_id: String,
    pub date: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub payment: Option<PaymentDetails>,
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), BookingError> {
    let Json(req) = body.map_err(|e| BookingError::Validation(e.body_text()))?;

    let patron = Patron::new(req.name.trim(), req.email.trim(), req.phone.trim());
    let booking = state
        .coordinator
        .book(&req.seat_id, &req.date, patron, req.payment)
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}
