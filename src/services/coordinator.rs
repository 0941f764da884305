//! Validation and the atomic check-and-commit for a single (seat, date) claim.
//!
//! The commit is one conditional insert against the booking repository. No
//! lock is taken here; claims on different keys proceed independently and
//! racing claims on the same key are settled by the store's uniqueness
//! guarantee: one insert wins, every other caller gets `AlreadyBooked`.

use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    error::BookingError,
    models::{parse_date, Booking, Patron, PaymentDetails},
    services::{
        inventory::SeatInventory, notification::NotificationDispatcher, payment::PaymentAuthorizer,
    },
    storage::BookingRepository,
};

#[derive(Clone)]
pub struct BookingCoordinator {
    inventory: SeatInventory,
    bookings: Arc<dyn BookingRepository>,
    payment: Option<Arc<dyn PaymentAuthorizer>>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl BookingCoordinator {
    pub fn new(
        inventory: SeatInventory,
        bookings: Arc<dyn BookingRepository>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            inventory,
            bookings,
            payment: None,
            notifier,
        }
    }

    /// Requires an approved payment before any booking is committed.
    pub fn with_payment(mut self, authorizer: Arc<dyn PaymentAuthorizer>) -> Self {
        self.payment = Some(authorizer);
        self
    }

    pub fn requires_payment(&self) -> bool {
        self.payment.is_some()
    }

    pub async fn book(
        &self,
        seat_id: &str,
        date: &str,
        patron: Patron,
        payment: Option<PaymentDetails>,
    ) -> Result<Booking, BookingError> {
        // 1. Дешёвые проверки входа, без обращения к броням
        let seat_id = seat_id.trim();
        if seat_id.is_empty() {
            return Err(BookingError::Validation("seatId is required".to_string()));
        }
        let date = parse_date(date)?;
        patron.validate()?;
        let seat = self.inventory.get(seat_id).await?;

        // 2. Уже занято - отказываем до списания денег; решающей проверкой остаётся вставка
        if self.bookings.find_booking(&seat.seat_id, date).await?.is_some() {
            warn!(seat_id = %seat.seat_id, %date, "Seat already booked");
            return Err(BookingError::AlreadyBooked { seat_id: seat.seat_id, date });
        }

        // 3. Оплата, если шлюз подключён
        if let Some(authorizer) = &self.payment {
            let details = payment.ok_or_else(|| {
                BookingError::Validation("payment details are required".to_string())
            })?;
            if !authorizer.authorize(&details, seat.base_price).await {
                warn!(seat_id = %seat.seat_id, %date, "Payment declined, booking not recorded");
                return Err(BookingError::PaymentDeclined);
            }
        }

        // 4. Атомарная фиксация
        let booking = self.commit(Booking::new(seat.seat_id, date, patron)).await?;
        info!(seat_id = %booking.seat_id, date = %booking.date, "Booking committed");

        // 5. Подтверждение - в фоне, ошибка не отменяет бронь
        self.dispatch_confirmation(&booking);
        Ok(booking)
    }

    /// Runs the conditional insert on its own task so that a caller dropping the
    /// request mid-flight cannot leave the outcome undetermined.
    async fn commit(&self, booking: Booking) -> Result<Booking, BookingError> {
        let bookings = Arc::clone(&self.bookings);
        let outcome = tokio::spawn(async move {
            bookings.insert_if_absent(&booking).await.map(|()| booking)
        })
        .await
        .map_err(|e| BookingError::StorageUnavailable(format!("commit task failed: {e}")))?;

        if let Err(BookingError::AlreadyBooked { seat_id, date }) = &outcome {
            warn!(%seat_id, %date, "Lost booking race");
        }
        outcome
    }

    fn dispatch_confirmation(&self, booking: &Booking) {
        let notifier = Arc::clone(&self.notifier);
        let email = booking.patron.email.clone();
        let name = booking.patron.name.clone();
        let seat_id = booking.seat_id.clone();
        let date = booking.date;

        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&email, &seat_id, date, &name).await {
                warn!(%seat_id, %date, error = %e, "NotificationFailure: booking kept, confirmation not delivered");
            }
        });
    }
}
