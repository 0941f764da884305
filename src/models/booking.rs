use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::BookingError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a calendar date in strict `YYYY-MM-DD` form: zero-padded, unsigned,
/// no time part.
pub fn parse_date(raw: &str) -> Result<NaiveDate, BookingError> {
    let trimmed = raw.trim();
    let invalid = || BookingError::InvalidDate(raw.to_string());

    let date = NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| invalid())?;
    // chrono принимает "2025-7-4" и "+2025-07-04"; допускаем только каноническую запись
    if date.format(DATE_FORMAT).to_string() != trimmed {
        return Err(invalid());
    }
    Ok(date)
}

fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

/// `local@domain.tld`: no whitespace, one `@`, and a dot inside the domain.
fn dotted_domain(value: &str) -> Result<(), validator::ValidationError> {
    let shaped = value.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !value.chars().any(char::is_whitespace)
            && !domain.contains('@')
            && domain
                .split_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
    });
    if !shaped {
        return Err(validator::ValidationError::new("email_domain"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Patron {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(email, custom(function = "dotted_domain"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub phone: String,
}

impl Patron {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Patron {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub seat_id: String,
    pub date: NaiveDate,
    pub patron: Patron,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(seat_id: impl Into<String>, date: NaiveDate, patron: Patron) -> Self {
        Booking {
            seat_id: seat_id.into(),
            date,
            patron,
            created_at: Utc::now(),
        }
    }
}

// Карточные данные, которые уходят только в платёжный шлюз
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub card_number: String,
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub cvv: String,
}

impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits: String = self.card_number.chars().filter(char::is_ascii_digit).collect();
        let tail = &digits[digits.len().saturating_sub(4)..];
        f.debug_struct("PaymentDetails")
            .field("card_number", &format!("****{tail}"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates_only() {
        assert_eq!(
            parse_date("2025-07-04").unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 4).unwrap()
        );
        for bad in [
            "",
            "2025-02-30",
            "04/07/2025",
            "2025-07-04T10:00:00",
            "tomorrow",
            "2025-7-4",
            "+2025-07-04",
        ] {
            assert!(
                matches!(parse_date(bad), Err(BookingError::InvalidDate(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn patron_requires_all_fields() {
        assert!(Patron::new("X", "x@x.com", "123").validate().is_ok());
        assert!(Patron::new("", "x@x.com", "123").validate().is_err());
        assert!(Patron::new("   ", "x@x.com", "123").validate().is_err());
        assert!(Patron::new("X", "x@x.com", "").validate().is_err());
        assert!(Patron::new("X", "not-an-email", "123").validate().is_err());
        assert!(Patron::new("X", "", "123").validate().is_err());
        assert!(Patron::new("X", "x@localhost", "123").validate().is_err());
        assert!(Patron::new("X", "x@.com", "123").validate().is_err());
        assert!(Patron::new("X", "ann.lee@mail.example.org", "123").validate().is_ok());
    }

    #[test]
    fn surrounding_whitespace_is_tolerated_in_dates() {
        assert_eq!(
            parse_date(" 2025-07-04 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 4).unwrap()
        );
    }

    #[test]
    fn patron_errors_name_the_fields() {
        let err: BookingError = Patron::new("", "nope", "123").validate().unwrap_err().into();
        assert_eq!(err.to_string(), "validation failed: invalid patron fields: email, name");
    }

    #[test]
    fn payment_debug_masks_card_number() {
        let details = PaymentDetails {
            card_number: "4111 1111 1111 1234".into(),
            expiry: "12/30".into(),
            cvv: "999".into(),
        };
        let printed = format!("{details:?}");
        assert!(printed.contains("****1234"));
        assert!(!printed.contains("4111"));
        assert!(!printed.contains("999"));
    }
}
