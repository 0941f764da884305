//! End-to-end behaviour of the booking core against the in-memory store:
//! concurrent claims, per-date independence, idempotent initialization and
//! availability projections.

use async_trait::async_trait;
use chrono::NaiveDate;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;

use seat_booking::{
    error::BookingError,
    models::{Category, LayoutConfig, Patron, SeatStatus},
    services::{
        availability::AvailabilityIndex, coordinator::BookingCoordinator, inventory::SeatInventory,
        notification::{LogNotifier, NotificationDispatcher},
    },
    storage::{memory::MemoryStore, BookingReader},
};

struct Engine {
    store: Arc<MemoryStore>,
    inventory: SeatInventory,
    availability: AvailabilityIndex,
    coordinator: BookingCoordinator,
}

async fn engine_with(layout: &LayoutConfig, notifier: Arc<dyn NotificationDispatcher>) -> Engine {
    let store = Arc::new(MemoryStore::new());
    let inventory = SeatInventory::new(store.clone());
    inventory.initialize(layout).await.unwrap();
    Engine {
        availability: AvailabilityIndex::new(inventory.clone(), store.clone()),
        coordinator: BookingCoordinator::new(inventory.clone(), store.clone(), notifier),
        inventory,
        store,
    }
}

async fn engine() -> Engine {
    engine_with(&LayoutConfig::default(), Arc::new(LogNotifier)).await
}

fn fake_patron() -> Patron {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    let phone = format!("555-{:04}", (0..10_000u32).fake::<u32>());
    Patron::new(name, email, phone)
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

struct RecordingNotifier {
    sent: mpsc::UnboundedSender<(String, String, NaiveDate)>,
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn notify(&self, email: &str, seat_id: &str, date: NaiveDate, _name: &str) -> Result<(), BookingError> {
        let _ = self.sent.send((email.to_string(), seat_id.to_string(), date));
        Ok(())
    }
}

struct BrokenNotifier {
    attempted: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl NotificationDispatcher for BrokenNotifier {
    async fn notify(&self, _: &str, seat_id: &str, _: NaiveDate, _: &str) -> Result<(), BookingError> {
        let _ = self.attempted.send(seat_id.to_string());
        Err(BookingError::NotificationFailure("smtp down".into()))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_claims_on_one_seat_have_exactly_one_winner() {
    let engine = engine().await;
    let contenders = 64;

    let outcomes = join_all((0..contenders).map(|_| {
        let coordinator = engine.coordinator.clone();
        tokio::spawn(async move { coordinator.book("C3", "2025-07-04", fake_patron(), None).await })
    }))
    .await;

    let mut wins = 0;
    let mut conflicts = 0;
    for outcome in outcomes {
        match outcome.unwrap() {
            Ok(_) => wins += 1,
            Err(BookingError::AlreadyBooked { seat_id, .. }) => {
                assert_eq!(seat_id, "C3");
                conflicts += 1;
            }
            Err(other) => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_eq!(wins, 1);
    assert_eq!(conflicts, contenders - 1);
    assert_eq!(engine.store.bookings_on(date("2025-07-04")).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn claims_on_distinct_seats_all_succeed() {
    let engine = engine().await;
    let seats = engine.inventory.list().await.unwrap();

    let handles: Vec<_> = seats
        .iter()
        .map(|seat| {
            let coordinator = engine.coordinator.clone();
            let seat_id = seat.seat_id.clone();
            tokio::spawn(async move { coordinator.book(&seat_id, "2025-07-04", fake_patron(), None).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let summary = engine.availability.summary(date("2025-07-04")).await.unwrap();
    assert_eq!(summary.booked, 60);
    assert_eq!(summary.available, 0);
}

#[tokio::test]
async fn same_seat_on_different_dates_is_independent() {
    let engine = engine().await;

    engine.coordinator.book("A1", "2025-07-04", fake_patron(), None).await.unwrap();
    engine.coordinator.book("A1", "2025-07-05", fake_patron(), None).await.unwrap();

    let again = engine.coordinator.book("A1", "2025-07-04", fake_patron(), None).await;
    assert!(matches!(again, Err(BookingError::AlreadyBooked { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_initialization_creates_each_seat_once() {
    let store = Arc::new(MemoryStore::new());
    let inventory = SeatInventory::new(store.clone());
    let layout = LayoutConfig::default();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let inventory = inventory.clone();
            let layout = layout.clone();
            tokio::spawn(async move { inventory.initialize(&layout).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        created += handle.await.unwrap().unwrap();
    }

    assert_eq!(created, 60);
    assert_eq!(inventory.count().await.unwrap(), 60);
    assert_eq!(inventory.initialize(&layout).await.unwrap(), 0);
}

#[tokio::test]
async fn default_venue_prices_follow_row_categories() {
    let engine = engine().await;

    let a1 = engine.inventory.get("A1").await.unwrap();
    assert_eq!(a1.category, Category::Gold);
    assert_eq!(a1.base_price, 15.0);

    let j6 = engine.inventory.get("J6").await.unwrap();
    assert_eq!(j6.category, Category::Silver);
    assert_eq!(j6.base_price, 10.0);

    let unknown = engine.inventory.get("Z99").await;
    assert!(matches!(unknown, Err(BookingError::SeatNotFound(id)) if id == "Z99"));
}

#[tokio::test]
async fn single_gold_row_walkthrough() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = engine_with(
        &LayoutConfig::single_row('A', 6, Category::Gold, 15.0),
        Arc::new(RecordingNotifier { sent: tx }),
    )
    .await;
    assert_eq!(engine.inventory.count().await.unwrap(), 6);

    let patron = Patron::new("X", "x@x.com", "123");
    let booking = engine
        .coordinator
        .book("A1", "2025-07-04", patron.clone(), None)
        .await
        .unwrap();
    assert_eq!(booking.patron, patron);

    let (email, seat_id, day) = rx.recv().await.unwrap();
    assert_eq!((email.as_str(), seat_id.as_str(), day), ("x@x.com", "A1", date("2025-07-04")));

    let listed = engine.availability.list_availability(date("2025-07-04")).await.unwrap();
    assert_eq!(listed.len(), 6);
    let a1 = &listed[0];
    assert_eq!(a1.seat_id, "A1");
    assert_eq!(a1.status, SeatStatus::Booked);
    assert_eq!(a1.booked_by.as_ref().unwrap().phone, "123");
    assert!(listed[1..].iter().all(|s| s.status == SeatStatus::Available));

    let second = engine.coordinator.book("A1", "2025-07-04", fake_patron(), None).await;
    assert!(matches!(second, Err(BookingError::AlreadyBooked { .. })));
    assert!(rx.try_recv().is_err());

    let next_day = engine.coordinator.book("A1", "2025-07-05", fake_patron(), None).await;
    assert!(next_day.is_ok());
}

#[tokio::test]
async fn failed_confirmation_keeps_the_booking() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = engine_with(&LayoutConfig::default(), Arc::new(BrokenNotifier { attempted: tx })).await;

    let booking = engine.coordinator.book("B2", "2025-07-04", fake_patron(), None).await;
    assert!(booking.is_ok());

    // уведомление действительно отправлялось и упало
    let attempted = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
        .await
        .expect("confirmation was never attempted");
    assert_eq!(attempted.as_deref(), Some("B2"));

    let stored = engine.store.find_booking("B2", date("2025-07-04")).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn availability_reflects_only_committed_bookings() {
    let engine = engine().await;
    engine.coordinator.book("E6", "2025-07-04", fake_patron(), None).await.unwrap();
    let _ = engine.coordinator.book("E6", "2025-07-04", fake_patron(), None).await;
    let _ = engine.coordinator.book("Z99", "2025-07-04", fake_patron(), None).await;

    let status = engine.availability.status_for(date("2025-07-04")).await.unwrap();
    assert_eq!(status.len(), 60);
    assert_eq!(status.values().filter(|s| s.status == SeatStatus::Booked).count(), 1);
    assert_eq!(status["E6"].status, SeatStatus::Booked);
}
