//! payment.rs
//!
//! Платёжный шлюз как необязательное условие перед фиксацией брони.
//!
//! Ключевые компоненты:
//! 1.  **PaymentAuthorizer**: узкий интерфейс "авторизовать оплату - да/нет".
//!     Координатор не фиксирует бронь, пока он не вернул `true`.
//! 2.  **MockPaymentAuthorizer**: имитация для разработки; одобряет карты
//!     из 12 и более цифр после искусственной задержки.
//! 3.  **GatewayPaymentAuthorizer**: HTTP-клиент внешнего шлюза. Запросы
//!     подписываются SHA-256 токеном и проходят через Circuit Breaker, так
//!     что недоступный шлюз быстро превращается в отказ, а не в зависание.

use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    config::{CircuitBreakerConfig, Config, PaymentConfig, PaymentMode},
    models::PaymentDetails,
};

#[async_trait]
pub trait PaymentAuthorizer: Send + Sync {
    /// `true` only when the charge for `amount` is approved.
    async fn authorize(&self, details: &PaymentDetails, amount: f64) -> bool;
}

/// Builds the authorizer selected by `PAYMENT_MODE`; `None` means bookings are free.
pub fn from_config(config: &Config) -> anyhow::Result<Option<Arc<dyn PaymentAuthorizer>>> {
    let authorizer: Option<Arc<dyn PaymentAuthorizer>> = match config.payment.mode {
        PaymentMode::Disabled => None,
        PaymentMode::Mock => Some(Arc::new(MockPaymentAuthorizer::new(Duration::from_millis(
            config.payment.mock_latency_ms,
        )))),
        PaymentMode::Gateway => Some(Arc::new(GatewayPaymentAuthorizer::from_config(
            &config.payment,
            &config.circuit_breaker,
        )?)),
    };
    Ok(authorizer)
}

/// Минимальная длина номера карты, которую принимает имитация.
const MIN_CARD_DIGITS: usize = 12;

#[derive(Debug, Clone)]
pub struct MockPaymentAuthorizer {
    latency: Duration,
}

impl MockPaymentAuthorizer {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl PaymentAuthorizer for MockPaymentAuthorizer {
    async fn authorize(&self, details: &PaymentDetails, amount: f64) -> bool {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let number: String = details.card_number.chars().filter(|c| !c.is_whitespace()).collect();
        let approved = number.len() >= MIN_CARD_DIGITS && number.chars().all(|c| c.is_ascii_digit());
        info!(amount, approved, "Mock payment processed");
        approved
    }
}

// --- Модели данных для API платёжного шлюза ---

/// Запрос на авторизацию платежа.
#[derive(Debug, Serialize)]
struct AuthorizeRequest<'a> {
    #[serde(rename = "teamSlug")]
    team_slug: &'a str,
    token: String,
    amount: i64,
    #[serde(rename = "orderId")]
    order_id: String,
    currency: &'a str,
    #[serde(rename = "cardNumber")]
    card_number: &'a str,
    expiry: &'a str,
    cvv: &'a str,
}

/// Ответ шлюза на авторизацию.
#[derive(Debug, Deserialize)]
struct AuthorizeResponse {
    success: bool,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

type Breaker = failsafe::StateMachine<
    failsafe::failure_policy::ConsecutiveFailures<failsafe::backoff::Constant>,
    (),
>;

/// Клиент внешнего платёжного шлюза под защитой Circuit Breaker.
pub struct GatewayPaymentAuthorizer {
    /// Идентификатор продавца.
    team_slug: String,
    /// Секретный пароль для генерации токенов.
    password: String,
    /// Базовый URL платёжного шлюза.
    base_url: String,
    currency: String,
    http_client: reqwest::Client,
    circuit_breaker: Breaker,
}

impl GatewayPaymentAuthorizer {
    pub fn from_config(payment: &PaymentConfig, breaker: &CircuitBreakerConfig) -> anyhow::Result<Self> {
        let policy = failsafe::failure_policy::consecutive_failures(
            breaker.failure_threshold,
            failsafe::backoff::constant(Duration::from_secs(breaker.timeout_seconds)),
        );
        let circuit_breaker = failsafe::Config::new().failure_policy(policy).build();

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            team_slug: payment.merchant_id.clone(),
            password: payment.merchant_password.clone(),
            base_url: payment.gateway_url.trim_end_matches('/').to_string(),
            currency: payment.currency.clone(),
            http_client,
            circuit_breaker,
        })
    }

    /// Токен подписи: sha256(amount + currency + orderId + password + teamSlug).
    fn sign(&self, amount: i64, order_id: &str) -> String {
        let token_string = format!(
            "{}{}{}{}{}",
            amount, self.currency, order_id, self.password, self.team_slug
        );
        let mut hasher = Sha256::new();
        hasher.update(token_string.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Сумма в минимальных единицах валюты.
fn minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[async_trait]
impl PaymentAuthorizer for GatewayPaymentAuthorizer {
    async fn authorize(&self, details: &PaymentDetails, amount: f64) -> bool {
        let amount = minor_units(amount);
        let order_id = Uuid::new_v4().to_string();
        let request = AuthorizeRequest {
            team_slug: &self.team_slug,
            token: self.sign(amount, &order_id),
            amount,
            order_id,
            currency: &self.currency,
            card_number: &details.card_number,
            expiry: &details.expiry,
            cvv: &details.cvv,
        };

        let operation = async {
            self.http_client
                .post(format!("{}/PaymentAuthorize/authorize", self.base_url))
                .json(&request)
                .send()
                .await?
                .error_for_status()?
                .json::<AuthorizeResponse>()
                .await
        };

        match self.circuit_breaker.call(operation).await {
            Ok(response) => {
                if !response.success {
                    warn!(
                        status = ?response.status,
                        message = ?response.message,
                        "Payment gateway declined authorization"
                    );
                }
                response.success
            }
            Err(failsafe::Error::Rejected) => {
                warn!("Circuit breaker is OPEN - payment gateway request rejected");
                false
            }
            Err(failsafe::Error::Inner(e)) => {
                error!("Payment gateway request failed: {:?}", e);
                false
            }
        }
    }
}
