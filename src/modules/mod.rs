pub mod admin;
pub mod bookings;
pub mod interviewer;
pub mod notifications;
