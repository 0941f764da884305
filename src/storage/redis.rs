use ::redis::AsyncCommands;
use async_trait::async_trait;
use chrono::NaiveDate;

use super::{BookingReader, BookingRepository, SeatRepository};
use crate::{
    error::BookingError,
    models::{seat::sort_seats, Booking, Seat},
    redis_client::RedisClient,
};

/// Redis-backed store.
///
/// Seats live in one hash keyed by seat id; bookings in one hash per date keyed
/// by seat id. `HSETNX` is the conditional write: it sets the field only when
/// it is absent and reports whether it did.
#[derive(Clone)]
pub struct RedisStore {
    redis: RedisClient,
    prefix: String,
}

impl RedisStore {
    pub fn new(redis: RedisClient, prefix: &str) -> Self {
        Self {
            redis,
            prefix: prefix.to_string(),
        }
    }

    fn seats_key(&self) -> String {
        format!("{}:seats", self.prefix)
    }

    fn bookings_key(&self, date: NaiveDate) -> String {
        format!("{}:bookings:{}", self.prefix, date)
    }
}

fn decode<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, BookingError> {
    serde_json::from_str(raw)
        .map_err(|e| BookingError::StorageUnavailable(format!("corrupt record in redis: {e}")))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, BookingError> {
    serde_json::to_string(value)
        .map_err(|e| BookingError::StorageUnavailable(format!("failed to encode record: {e}")))
}

#[async_trait]
impl SeatRepository for RedisStore {
    async fn insert_missing(&self, seats: &[Seat]) -> Result<usize, BookingError> {
        let key = self.seats_key();
        let mut conn = self.redis.conn.clone();

        // Конвейер HSETNX: каждое поле создаётся не более одного раза
        let mut pipe = ::redis::pipe();
        for seat in seats {
            pipe.hset_nx(&key, &seat.seat_id, encode(seat)?);
        }
        let results: Vec<bool> = pipe.query_async(&mut conn).await?;

        Ok(results.into_iter().filter(|created| *created).count())
    }

    async fn find_seat(&self, seat_id: &str) -> Result<Option<Seat>, BookingError> {
        let mut conn = self.redis.conn.clone();
        let raw: Option<String> = conn.hget(self.seats_key(), seat_id).await?;
        raw.as_deref().map(decode).transpose()
    }

    async fn list_seats(&self) -> Result<Vec<Seat>, BookingError> {
        let mut conn = self.redis.conn.clone();
        let raw: Vec<String> = conn.hvals(self.seats_key()).await?;
        let mut seats = raw.iter().map(|r| decode::<Seat>(r)).collect::<Result<Vec<_>, _>>()?;
        sort_seats(&mut seats);
        Ok(seats)
    }

    async fn count_seats(&self) -> Result<usize, BookingError> {
        let mut conn = self.redis.conn.clone();
        let count: usize = conn.hlen(self.seats_key()).await?;
        Ok(count)
    }
}

#[async_trait]
impl BookingReader for RedisStore {
    async fn find_booking(&self, seat_id: &str, date: NaiveDate) -> Result<Option<Booking>, BookingError> {
        let mut conn = self.redis.conn.clone();
        let raw: Option<String> = conn.hget(self.bookings_key(date), seat_id).await?;
        raw.as_deref().map(decode).transpose()
    }

    async fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, BookingError> {
        let mut conn = self.redis.conn.clone();
        let raw: Vec<String> = conn.hvals(self.bookings_key(date)).await?;
        raw.iter().map(|r| decode(r)).collect()
    }
}

#[async_trait]
impl BookingRepository for RedisStore {
    async fn insert_if_absent(&self, booking: &Booking) -> Result<(), BookingError> {
        let mut conn = self.redis.conn.clone();
        let created: bool = conn
            .hset_nx(self.bookings_key(booking.date), &booking.seat_id, encode(booking)?)
            .await?;

        if created {
            Ok(())
        } else {
            Err(BookingError::AlreadyBooked {
                seat_id: booking.seat_id.clone(),
                date: booking.date,
            })
        }
    }
}
