use redis::{aio::ConnectionManager, Client};

use crate::{config::RedisConfig, error::BookingError};

/// Соединение с автоматическим переподключением; клонируется дёшево.
#[derive(Clone)]
pub struct RedisClient {
    pub conn: ConnectionManager,
}

impl RedisClient {
    pub async fn connect(config: &RedisConfig) -> Result<Self, BookingError> {
        let url = config.url.as_deref().ok_or_else(|| {
            BookingError::StorageUnavailable("REDIS_URL must be set for redis storage".into())
        })?;
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(RedisClient { conn })
    }
}
