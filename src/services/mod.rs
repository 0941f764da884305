pub mod availability;
pub mod coordinator;
pub mod inventory;
pub mod notification;
pub mod payment;
