use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;

use crate::{config::DatabaseConfig, error::BookingError};

/// Пул соединений Postgres для каталога мест и броней.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, BookingError> {
        let url = config.url.as_deref().ok_or_else(|| {
            BookingError::StorageUnavailable("DATABASE_URL must be set for postgres storage".into())
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(url)
            .await?;

        Ok(Database { pool })
    }

    // Схема содержит единственное, от чего зависит корректность: PRIMARY KEY (seat_id, booking_date)
    pub async fn migrate(&self) -> Result<(), BookingError> {
        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        info!("Migrations completed");
        Ok(())
    }
}
