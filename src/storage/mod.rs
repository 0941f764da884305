//! Repository capabilities the booking core depends on.
//!
//! The whole consistency story rests on one primitive: "insert the booking
//! if (seat_id, date) is absent", executed atomically by the backend. Every
//! implementation here provides it through a uniqueness guarantee of the
//! underlying store rather than a lock held by the caller.

pub mod memory;
pub mod postgres;
pub mod redis;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

use crate::{
    config::{Config, StorageBackend},
    database::Database,
    error::BookingError,
    models::{Booking, Seat},
    redis_client::RedisClient,
};

#[async_trait]
pub trait SeatRepository: Send + Sync {
    /// Inserts every seat whose id is not stored yet and returns how many were new.
    async fn insert_missing(&self, seats: &[Seat]) -> Result<usize, BookingError>;

    async fn find_seat(&self, seat_id: &str) -> Result<Option<Seat>, BookingError>;

    /// All seats, row-major.
    async fn list_seats(&self) -> Result<Vec<Seat>, BookingError>;

    async fn count_seats(&self) -> Result<usize, BookingError>;
}

/// Read side of the booking store.
#[async_trait]
pub trait BookingReader: Send + Sync {
    async fn find_booking(&self, seat_id: &str, date: NaiveDate) -> Result<Option<Booking>, BookingError>;

    async fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, BookingError>;
}

#[async_trait]
pub trait BookingRepository: BookingReader {
    /// Atomic check-and-insert keyed by `(seat_id, date)`.
    ///
    /// Returns `AlreadyBooked` when the key is taken; never overwrites.
    async fn insert_if_absent(&self, booking: &Booking) -> Result<(), BookingError>;
}

/// Набор репозиториев поверх одного выбранного хранилища.
#[derive(Clone)]
pub struct Storage {
    pub backend: StorageBackend,
    pub seats: Arc<dyn SeatRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub reader: Arc<dyn BookingReader>,
}

impl Storage {
    pub fn from_store<S>(backend: StorageBackend, store: Arc<S>) -> Self
    where
        S: SeatRepository + BookingRepository + 'static,
    {
        Storage {
            backend,
            seats: store.clone(),
            bookings: store.clone(),
            reader: store,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(StorageBackend::Memory, Arc::new(memory::MemoryStore::new()))
    }

    pub async fn connect(config: &Config) -> Result<Self, BookingError> {
        match config.storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage");
                Ok(Self::in_memory())
            }
            StorageBackend::Postgres => {
                let db = Database::connect(&config.database).await?;
                db.migrate().await?;
                info!("Database connected");
                Ok(Self::from_store(StorageBackend::Postgres, Arc::new(postgres::PgStore::new(db))))
            }
            StorageBackend::Redis => {
                let client = RedisClient::connect(&config.redis).await?;
                info!("Redis connected");
                let store = redis::RedisStore::new(client, &config.redis.key_prefix);
                Ok(Self::from_store(StorageBackend::Redis, Arc::new(store)))
            }
        }
    }
}
