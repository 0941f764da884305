use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use tracing::info;

use crate::{
    config::{Config, SmtpConfig},
    error::BookingError,
};

/// Sends the booking confirmation. Failures are advisory: the caller logs them
/// and the booking stays committed.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, email: &str, seat_id: &str, date: NaiveDate, name: &str) -> Result<(), BookingError>;
}

pub fn from_config(config: &Config) -> anyhow::Result<Arc<dyn NotificationDispatcher>> {
    match &config.notification.smtp {
        Some(smtp) => {
            info!(host = %smtp.host, "Booking confirmations will be sent over SMTP");
            Ok(Arc::new(SmtpNotifier::new(smtp)?))
        }
        None => Ok(Arc::new(LogNotifier)),
    }
}

/// Пишет подтверждение в лог вместо письма (режим разработки).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationDispatcher for LogNotifier {
    async fn notify(&self, email: &str, seat_id: &str, date: NaiveDate, name: &str) -> Result<(), BookingError> {
        info!(%email, %seat_id, %date, %name, "Booking confirmation");
        Ok(())
    }
}

pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email).parse()?;

        let mailer = if config.user.is_empty() {
            // Без аутентификации (локальный SMTP для разработки)
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .build()
        } else {
            let creds = Credentials::new(config.user.clone(), config.password.clone());
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
                .credentials(creds)
                .port(config.port)
                .build()
        };

        Ok(Self { mailer, from })
    }
}

/// Экранирует пользовательский ввод перед вставкой в HTML письма.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn confirmation_body(seat_id: &str, date: NaiveDate, name: &str) -> String {
    let name = escape_html(name);
    let seat_id = escape_html(seat_id);
    format!(
        "<h2>Booking Confirmation</h2>\
         <p>Thank you for your booking, {name}!</p>\
         <p>Booked Seat: {seat_id}</p>\
         <p>Date: {date}</p>\
         <p>We'll see you at the event!</p>"
    )
}

#[async_trait]
impl NotificationDispatcher for SmtpNotifier {
    async fn notify(&self, email: &str, seat_id: &str, date: NaiveDate, name: &str) -> Result<(), BookingError> {
        let to: Mailbox = email
            .parse()
            .map_err(|e| BookingError::NotificationFailure(format!("invalid recipient {email}: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Booking Confirmation")
            .header(ContentType::TEXT_HTML)
            .body(confirmation_body(seat_id, date, name))
            .map_err(|e| BookingError::NotificationFailure(format!("failed to build email: {e}")))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| BookingError::NotificationFailure(format!("failed to send email: {e}")))?;

        info!("Confirmation email sent to {}", email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        assert!(LogNotifier.notify("x@x.com", "A1", date, "X").await.is_ok());
    }

    #[test]
    fn confirmation_names_seat_and_date() {
        let body = confirmation_body("B3", NaiveDate::from_ymd_opt(2025, 7, 5).unwrap(), "Ada");
        assert!(body.contains("Booked Seat: B3"));
        assert!(body.contains("2025-07-05"));
        assert!(body.contains("Ada"));
    }

    #[test]
    fn patron_supplied_markup_is_escaped() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 5).unwrap();
        let body = confirmation_body("B3", date, "<a href=x>O'Brien & \"Co\"</a>");

        assert!(!body.contains("<a href"));
        assert!(body.contains("&lt;a href=x&gt;O&#39;Brien &amp; &quot;Co&quot;&lt;/a&gt;"));
    }

    #[tokio::test]
    async fn unreachable_smtp_server_is_a_notification_failure() {
        let notifier = SmtpNotifier::new(&SmtpConfig {
            host: "127.0.0.1".into(),
            port: 1,
            user: String::new(),
            password: String::new(),
            from_email: "box-office@example.com".into(),
            from_name: "Box Office".into(),
        })
        .unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        let err = notifier.notify("x@x.com", "A1", date, "X").await.unwrap_err();
        assert!(matches!(err, BookingError::NotificationFailure(_)));
    }
}
