mod layout;

pub use layout::load_layout;

use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub payment: PaymentConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub notification: NotificationConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
    pub layout_file: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
    Redis,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Postgres => "postgres",
            StorageBackend::Redis => "redis",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "redis" => Ok(StorageBackend::Redis),
            other => Err(anyhow!("unknown storage backend `{other}`")),
        }
    }
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow!("unknown log format `{other}`")),
        }
    }
}

// Выбор хранилища броней
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
    pub key_prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Disabled,
    Mock,
    Gateway,
}

impl FromStr for PaymentMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disabled" | "off" | "none" => Ok(PaymentMode::Disabled),
            "mock" => Ok(PaymentMode::Mock),
            "gateway" => Ok(PaymentMode::Gateway),
            other => Err(anyhow!("unknown payment mode `{other}`")),
        }
    }
}

// Настройки платежного шлюза
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub mode: PaymentMode,
    pub merchant_id: String,
    pub merchant_password: String,
    pub gateway_url: String,
    pub currency: String,
    pub mock_latency_ms: u64,
}

// Настройки Circuit Breaker
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
}

// Настройки отправки подтверждений
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    pub smtp: Option<SmtpConfig>,
}

#[derive(Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("from_email", &self.from_email)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                environment: "development".to_string(),
                rust_log: "seat_booking=debug,tower_http=debug".to_string(),
                log_format: LogFormat::Pretty,
                layout_file: "layout.toml".to_string(),
            },
            storage: StorageConfig { backend: StorageBackend::Memory },
            database: DatabaseConfig { url: None, pool_size: 20, acquire_timeout_secs: 5 },
            redis: RedisConfig { url: None, key_prefix: "seat_booking".to_string() },
            payment: PaymentConfig {
                mode: PaymentMode::Disabled,
                merchant_id: String::new(),
                merchant_password: String::new(),
                gateway_url: "https://payments.example.com/api/v1".to_string(),
                currency: "USD".to_string(),
                mock_latency_ms: 1000,
            },
            circuit_breaker: CircuitBreakerConfig { failure_threshold: 5, timeout_seconds: 60 },
            notification: NotificationConfig { smtp: None },
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value `{raw}`: {e}")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();

        let smtp = match var("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_var("SMTP_PORT", 587)?,
                user: var("SMTP_USER").unwrap_or_default(),
                password: var("SMTP_PASSWORD").unwrap_or_default(),
                from_email: var("SMTP_FROM_EMAIL").context("SMTP_FROM_EMAIL must be set when SMTP_HOST is")?,
                from_name: var("SMTP_FROM_NAME").unwrap_or_else(|| "Seat Booking".to_string()),
            }),
            None => None,
        };

        let config = Config {
            app: AppConfig {
                host: var("HOST").unwrap_or(defaults.app.host),
                port: parse_var("PORT", defaults.app.port)?,
                environment: var("ENVIRONMENT").unwrap_or(defaults.app.environment),
                rust_log: var("RUST_LOG").unwrap_or(defaults.app.rust_log),
                log_format: parse_var("LOG_FORMAT", defaults.app.log_format)?,
                layout_file: var("SEAT_LAYOUT_FILE").unwrap_or(defaults.app.layout_file),
            },
            storage: StorageConfig {
                backend: parse_var("STORAGE_BACKEND", defaults.storage.backend)?,
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL"),
                pool_size: parse_var("DB_POOL_SIZE", defaults.database.pool_size)?,
                acquire_timeout_secs: parse_var("DB_ACQUIRE_TIMEOUT_SECONDS", defaults.database.acquire_timeout_secs)?,
            },
            redis: RedisConfig {
                url: var("REDIS_URL"),
                key_prefix: var("REDIS_KEY_PREFIX").unwrap_or(defaults.redis.key_prefix),
            },
            payment: PaymentConfig {
                mode: parse_var("PAYMENT_MODE", defaults.payment.mode)?,
                merchant_id: var("MERCHANT_ID").unwrap_or_default(),
                merchant_password: var("MERCHANT_PASSWORD").unwrap_or_default(),
                gateway_url: var("PAYMENT_GATEWAY_URL").unwrap_or(defaults.payment.gateway_url),
                currency: var("PAYMENT_CURRENCY").unwrap_or(defaults.payment.currency),
                mock_latency_ms: parse_var("PAYMENT_MOCK_LATENCY_MS", defaults.payment.mock_latency_ms)?,
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: parse_var(
                    "CIRCUIT_BREAKER_FAILURE_THRESHOLD",
                    defaults.circuit_breaker.failure_threshold,
                )?,
                timeout_seconds: parse_var(
                    "CIRCUIT_BREAKER_TIMEOUT_SECONDS",
                    defaults.circuit_breaker.timeout_seconds,
                )?,
            },
            notification: NotificationConfig { smtp },
        };

        config.check()?;
        Ok(config)
    }

    /// Cross-field requirements that a single variable cannot express.
    pub fn check(&self) -> anyhow::Result<()> {
        if self.storage.backend == StorageBackend::Postgres && self.database.url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when STORAGE_BACKEND=postgres"));
        }
        if self.storage.backend == StorageBackend::Redis && self.redis.url.is_none() {
            return Err(anyhow!("REDIS_URL must be set when STORAGE_BACKEND=redis"));
        }
        if self.payment.mode == PaymentMode::Gateway
            && (self.payment.merchant_id.is_empty() || self.payment.merchant_password.is_empty())
        {
            return Err(anyhow!("MERCHANT_ID and MERCHANT_PASSWORD must be set when PAYMENT_MODE=gateway"));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(anyhow!("CIRCUIT_BREAKER_FAILURE_THRESHOLD must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_run_without_external_services() {
        let config = Config::default();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.payment.mode, PaymentMode::Disabled);
        assert!(config.notification.smtp.is_none());
        assert!(config.check().is_ok());
    }

    #[test]
    fn postgres_backend_requires_a_url() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Postgres;
        assert!(config.check().is_err());

        config.database.url = Some("postgres://localhost/seats".into());
        assert!(config.check().is_ok());
    }

    #[test]
    fn gateway_payment_requires_merchant_credentials() {
        let mut config = Config::default();
        config.payment.mode = PaymentMode::Gateway;
        assert!(config.check().is_err());

        config.payment.merchant_id = "team".into();
        config.payment.merchant_password = "secret".into();
        assert!(config.check().is_ok());
    }

    #[test]
    fn enum_values_parse_case_insensitively() {
        assert_eq!("Postgres".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("off".parse::<PaymentMode>().unwrap(), PaymentMode::Disabled);
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }
}
