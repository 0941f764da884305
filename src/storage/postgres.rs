use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use super::{BookingReader, BookingRepository, SeatRepository};
use crate::{
    database::Database,
    error::BookingError,
    models::{Booking, Category, Patron, Seat},
};

/// Postgres-backed store; the `(seat_id, booking_date)` primary key is the commit guard.
#[derive(Clone)]
pub struct PgStore {
    db: Database,
}

impl PgStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct SeatRow {
    seat_id: String,
    seat_row: String,
    seat_column: i32,
    category: String,
    base_price: f64,
}

impl TryFrom<SeatRow> for Seat {
    type Error = BookingError;

    fn try_from(row: SeatRow) -> Result<Self, Self::Error> {
        let label = row
            .seat_row
            .chars()
            .next()
            .ok_or_else(|| BookingError::StorageUnavailable(format!("seat {} has an empty row", row.seat_id)))?;
        let column = u32::try_from(row.seat_column).map_err(|_| {
            BookingError::StorageUnavailable(format!("seat {} has a negative column", row.seat_id))
        })?;
        let category: Category = row
            .category
            .parse()
            .map_err(BookingError::StorageUnavailable)?;
        Ok(Seat {
            seat_id: row.seat_id,
            row: label,
            column,
            category,
            base_price: row.base_price,
        })
    }
}

#[derive(FromRow)]
struct BookingRow {
    seat_id: String,
    booking_date: NaiveDate,
    patron_name: String,
    patron_email: String,
    patron_phone: String,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            seat_id: row.seat_id,
            date: row.booking_date,
            patron: Patron::new(row.patron_name, row.patron_email, row.patron_phone),
            created_at: row.created_at,
        }
    }
}

const SEAT_COLUMNS: &str = "seat_id, seat_row, seat_column, category, base_price";
const BOOKING_COLUMNS: &str =
    "seat_id, booking_date, patron_name, patron_email, patron_phone, created_at";

#[async_trait]
impl SeatRepository for PgStore {
    async fn insert_missing(&self, seats: &[Seat]) -> Result<usize, BookingError> {
        let mut tx = self.db.pool.begin().await?;
        let mut created = 0;

        for seat in seats {
            let column = i32::try_from(seat.column).map_err(|_| {
                BookingError::Validation(format!("seat {} has an out-of-range column", seat.seat_id))
            })?;
            // ON CONFLICT DO NOTHING: параллельная инициализация не создаёт дублей
            let result = sqlx::query(
                r#"
                INSERT INTO seats (seat_id, seat_row, seat_column, category, base_price)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(&seat.seat_id)
            .bind(seat.row.to_string())
            .bind(column)
            .bind(seat.category.as_str())
            .bind(seat.base_price)
            .execute(&mut *tx)
            .await?;
            created += result.rows_affected() as usize;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_seat(&self, seat_id: &str) -> Result<Option<Seat>, BookingError> {
        let row = sqlx::query_as::<_, SeatRow>(&format!(
            "SELECT {SEAT_COLUMNS} FROM seats WHERE seat_id = $1"
        ))
        .bind(seat_id)
        .fetch_optional(&self.db.pool)
        .await?;

        row.map(Seat::try_from).transpose()
    }

    async fn list_seats(&self) -> Result<Vec<Seat>, BookingError> {
        sqlx::query_as::<_, SeatRow>(&format!(
            "SELECT {SEAT_COLUMNS} FROM seats ORDER BY seat_row, seat_column"
        ))
        .fetch_all(&self.db.pool)
        .await?
        .into_iter()
        .map(Seat::try_from)
        .collect()
    }

    async fn count_seats(&self) -> Result<usize, BookingError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seats")
            .fetch_one(&self.db.pool)
            .await?;
        Ok(count as usize)
    }
}

#[async_trait]
impl BookingReader for PgStore {
    async fn find_booking(&self, seat_id: &str, date: NaiveDate) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE seat_id = $1 AND booking_date = $2"
        ))
        .bind(seat_id)
        .bind(date)
        .fetch_optional(&self.db.pool)
        .await?;

        Ok(row.map(Booking::from))
    }

    async fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, BookingError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_date = $1"
        ))
        .bind(date)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }
}

#[async_trait]
impl BookingRepository for PgStore {
    async fn insert_if_absent(&self, booking: &Booking) -> Result<(), BookingError> {
        // Один оператор: проверка и вставка выполняются атомарно на стороне БД
        let inserted = sqlx::query(
            r#"
            INSERT INTO bookings (seat_id, booking_date, patron_name, patron_email, patron_phone, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (seat_id, booking_date) DO NOTHING
            "#,
        )
        .bind(&booking.seat_id)
        .bind(booking.date)
        .bind(&booking.patron.name)
        .bind(&booking.patron.email)
        .bind(&booking.patron.phone)
        .bind(booking.created_at)
        .execute(&self.db.pool)
        .await?
        .rows_affected()
            > 0;

        if inserted {
            Ok(())
        } else {
            Err(BookingError::AlreadyBooked {
                seat_id: booking.seat_id.clone(),
                date: booking.date,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(seat_column: i32, category: &str) -> SeatRow {
        SeatRow {
            seat_id: "A1".into(),
            seat_row: "A".into(),
            seat_column,
            category: category.into(),
            base_price: 15.0,
        }
    }

    #[test]
    fn seat_rows_convert_with_checked_columns() {
        let seat = Seat::try_from(row(1, "gold")).unwrap();
        assert_eq!(seat, Seat::new('A', 1, Category::Gold, 15.0));

        assert!(matches!(
            Seat::try_from(row(-1, "gold")),
            Err(BookingError::StorageUnavailable(_))
        ));
        assert!(Seat::try_from(row(1, "platinum")).is_err());
    }
}
