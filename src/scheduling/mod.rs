//! Slot allocation and the booking lifecycle: availability queries,
//! creation, rescheduling, cancellation and status changes.

pub mod availability;
pub mod booking;
pub mod calendar;
pub mod cancel;
pub mod clock;
pub mod notify;
pub mod reschedule;
pub mod status;
pub mod time_label;
pub mod window;
