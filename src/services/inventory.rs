use std::sync::Arc;
use tracing::info;

use crate::{
    error::BookingError,
    models::{LayoutConfig, Seat},
    storage::SeatRepository,
};

/// Static seat catalog. Written once at startup, read-only afterwards.
#[derive(Clone)]
pub struct SeatInventory {
    repo: Arc<dyn SeatRepository>,
}

impl SeatInventory {
    pub fn new(repo: Arc<dyn SeatRepository>) -> Self {
        Self { repo }
    }

    /// Creates one seat per (row, column) of `layout` and returns how many were created.
    ///
    /// A non-empty inventory is left untouched and reports 0. Concurrent first
    /// boots may both pass the emptiness check; the repository's per-seat
    /// uniqueness keeps the catalog free of duplicates in that case.
    pub async fn initialize(&self, layout: &LayoutConfig) -> Result<usize, BookingError> {
        let seats = layout.seats()?;

        let existing = self.repo.count_seats().await?;
        if existing > 0 {
            info!(existing, "Seat inventory already initialized, skipping");
            return Ok(0);
        }

        let created = self.repo.insert_missing(&seats).await?;
        info!(created, expected = seats.len(), "Seat inventory initialized");
        Ok(created)
    }

    pub async fn get(&self, seat_id: &str) -> Result<Seat, BookingError> {
        self.repo
            .find_seat(seat_id)
            .await?
            .ok_or_else(|| BookingError::SeatNotFound(seat_id.to_string()))
    }

    /// All seats, row-major with columns ascending.
    pub async fn list(&self) -> Result<Vec<Seat>, BookingError> {
        self.repo.list_seats().await
    }

    pub async fn count(&self) -> Result<usize, BookingError> {
        self.repo.count_seats().await
    }
}
