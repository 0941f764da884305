use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::{
    error::BookingError,
    models::{AvailabilitySummary, BookedBy, Booking, SeatAvailability, SeatState, SeatStatus},
    services::inventory::SeatInventory,
    storage::BookingReader,
};

/// Read-only projection of seat status for a date.
///
/// Not linearized against concurrent commits: a read racing a booking may see
/// either side of it. Booking decisions never go through here.
#[derive(Clone)]
pub struct AvailabilityIndex {
    inventory: SeatInventory,
    bookings: Arc<dyn BookingReader>,
}

fn booked_by(booking: &Booking) -> BookedBy {
    BookedBy {
        name: booking.patron.name.clone(),
        phone: booking.patron.phone.clone(),
    }
}

impl AvailabilityIndex {
    pub fn new(inventory: SeatInventory, bookings: Arc<dyn BookingReader>) -> Self {
        Self { inventory, bookings }
    }

    async fn booked_on(&self, date: NaiveDate) -> Result<HashMap<String, Booking>, BookingError> {
        Ok(self
            .bookings
            .bookings_on(date)
            .await?
            .into_iter()
            .map(|b| (b.seat_id.clone(), b))
            .collect())
    }

    pub async fn status_for(&self, date: NaiveDate) -> Result<BTreeMap<String, SeatState>, BookingError> {
        let (booked, seats) = futures::try_join!(self.booked_on(date), self.inventory.list())?;

        Ok(seats
            .into_iter()
            .map(|seat| {
                let state = match booked.get(&seat.seat_id) {
                    Some(booking) => SeatState {
                        status: SeatStatus::Booked,
                        booked_by: Some(booked_by(booking)),
                    },
                    None => SeatState { status: SeatStatus::Available, booked_by: None },
                };
                (seat.seat_id, state)
            })
            .collect())
    }

    /// Every seat with its status on `date`, in inventory order.
    pub async fn list_availability(&self, date: NaiveDate) -> Result<Vec<SeatAvailability>, BookingError> {
        let (booked, seats) = futures::try_join!(self.booked_on(date), self.inventory.list())?;

        Ok(seats
            .into_iter()
            .map(|seat| {
                let holder = booked.get(&seat.seat_id).map(booked_by);
                SeatAvailability {
                    status: if holder.is_some() { SeatStatus::Booked } else { SeatStatus::Available },
                    booked_by: holder,
                    seat_id: seat.seat_id,
                    row: seat.row,
                    column: seat.column,
                    category: seat.category,
                    price: seat.base_price,
                }
            })
            .collect())
    }

    pub async fn summary(&self, date: NaiveDate) -> Result<AvailabilitySummary, BookingError> {
        let seats = self.list_availability(date).await?;
        let booked = seats.iter().filter(|s| s.status == SeatStatus::Booked).count();
        Ok(AvailabilitySummary {
            date,
            total: seats.len(),
            booked,
            available: seats.len() - booked,
        })
    }
}
