use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    cancel_booking, create_booking, get_booking, list_bookings, list_slots, reschedule_booking,
};
use crate::app_state::AppState;

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings))
        .route("/slots", get(list_slots))
        .route("/create", post(create_booking))
        .route("/{id}", get(get_booking))
        .route("/{id}/reschedule", put(reschedule_booking))
        .route("/{id}/cancel", put(cancel_booking))
}
