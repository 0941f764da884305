use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::{mapref::entry::Entry, DashMap};

use super::{BookingReader, BookingRepository, SeatRepository};
use crate::{
    error::BookingError,
    models::{seat::sort_seats, Booking, Seat},
};

/// In-process store. Bookings are grouped per date, then keyed by seat;
/// `DashMap::entry` on the inner map locks only the shard that owns the seat,
/// so claims on different (seat, date) pairs never wait on each other.
#[derive(Default)]
pub struct MemoryStore {
    seats: DashMap<String, Seat>,
    bookings: DashMap<NaiveDate, DashMap<String, Booking>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SeatRepository for MemoryStore {
    async fn insert_missing(&self, seats: &[Seat]) -> Result<usize, BookingError> {
        let mut created = 0;
        for seat in seats {
            if let Entry::Vacant(slot) = self.seats.entry(seat.seat_id.clone()) {
                slot.insert(seat.clone());
                created += 1;
            }
        }
        Ok(created)
    }

    async fn find_seat(&self, seat_id: &str) -> Result<Option<Seat>, BookingError> {
        Ok(self.seats.get(seat_id).map(|s| s.value().clone()))
    }

    async fn list_seats(&self) -> Result<Vec<Seat>, BookingError> {
        let mut seats: Vec<Seat> = self.seats.iter().map(|s| s.value().clone()).collect();
        sort_seats(&mut seats);
        Ok(seats)
    }

    async fn count_seats(&self) -> Result<usize, BookingError> {
        Ok(self.seats.len())
    }
}

#[async_trait]
impl BookingReader for MemoryStore {
    async fn find_booking(&self, seat_id: &str, date: NaiveDate) -> Result<Option<Booking>, BookingError> {
        let Some(day) = self.bookings.get(&date) else {
            return Ok(None);
        };
        let found = day.get(seat_id).map(|b| b.value().clone());
        Ok(found)
    }

    async fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, BookingError> {
        let Some(day) = self.bookings.get(&date) else {
            return Ok(Vec::new());
        };
        let bookings = day.iter().map(|b| b.value().clone()).collect();
        Ok(bookings)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert_if_absent(&self, booking: &Booking) -> Result<(), BookingError> {
        // Корзина даты создаётся один раз; дальше держим только чтение внешней карты
        let day = self.bookings.entry(booking.date).or_default().downgrade();
        let outcome = match day.entry(booking.seat_id.clone()) {
            Entry::Occupied(_) => Err(BookingError::AlreadyBooked {
                seat_id: booking.seat_id.clone(),
                date: booking.date,
            }),
            Entry::Vacant(slot) => {
                slot.insert(booking.clone());
                Ok(())
            }
        };
        outcome
    }
}
