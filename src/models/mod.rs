pub mod availability;
pub mod booking;
pub mod layout;
pub mod seat;

pub use availability::{AvailabilitySummary, BookedBy, SeatAvailability, SeatState, SeatStatus};
pub use booking::{parse_date, Booking, Patron, PaymentDetails};
pub use layout::{CategoryRule, LayoutConfig, Prices};
pub use seat::{Category, Seat};
