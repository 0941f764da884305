use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::BookingError,
    models::{parse_date, AvailabilitySummary, Seat, SeatAvailability},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats", get(list_seats))
        .route("/seats/summary", get(seat_summary))
        .route("/seats/{seat_id}", get(get_seat))
        .route("/inventory/initialize", post(initialize_inventory))
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

impl DateQuery {
    /// Без параметра - сегодняшняя дата по UTC.
    fn resolve(&self) -> Result<NaiveDate, BookingError> {
        match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => parse_date(raw),
            None => Ok(Utc::now().date_naive()),
        }
    }
}

// GET /api/seats?date=YYYY-MM-DD
pub async fn list_seats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<SeatAvailability>>, BookingError> {
    let date = query.resolve()?;
    Ok(Json(state.availability.list_availability(date).await?))
}

// GET /api/seats/summary?date=YYYY-MM-DD
pub async fn seat_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<AvailabilitySummary>, BookingError> {
    let date = query.resolve()?;
    Ok(Json(state.availability.summary(date).await?))
}

// GET /api/seats/{seat_id}
pub async fn get_seat(
    State(state): State<Arc<AppState>>,
    Path(seat_id): Path<String>,
) -> Result<Json<Seat>, BookingError> {
    Ok(Json(state.inventory.get(&seat_id).await?))
}

#[derive(Debug, Serialize)]
pub struct InitializeResponse {
    pub created: usize,
}

// POST /api/inventory/initialize
pub async fn initialize_inventory(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InitializeResponse>, BookingError> {
    let created = state.inventory.initialize(&state.layout).await?;
    Ok(Json(InitializeResponse { created }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_date_falls_back_to_today() {
        let query = DateQuery { date: Some("  ".into()) };
        assert_eq!(query.resolve().unwrap(), Utc::now().date_naive());
    }

    #[test]
    fn malformed_date_is_rejected() {
        let query = DateQuery { date: Some("07/04/2025".into()) };
        assert!(matches!(query.resolve(), Err(BookingError::InvalidDate(_))));
    }
}
