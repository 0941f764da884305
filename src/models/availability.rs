use chrono::NaiveDate;
use serde::Serialize;

use crate::models::seat::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Booked,
}

/// Who holds a seat on the queried date. Email stays with the patron's own confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookedBy {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatState {
    pub status: SeatStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booked_by: Option<BookedBy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAvailability {
    pub seat_id: String,
    pub row: char,
    pub column: u32,
    pub category: Category,
    pub price: f64,
    pub status: SeatStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booked_by: Option<BookedBy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilitySummary {
    pub date: NaiveDate,
    pub total: usize,
    pub booked: usize,
    pub available: usize,
}
