use axum::{
    routing::{delete, get, post, put},
    Router,
};

use super::handlers::{
    add_availability, delete_availability, list_assigned_interviews, list_availability,
    update_interview_status,
};
use crate::app_state::AppState;

pub fn interviewer_routes() -> Router<AppState> {
    Router::new()
        .route("/availability", get(list_availability))
        .route("/availability/add", post(add_availability))
        .route("/availability/delete/{slot_id}", delete(delete_availability))
        .route("/interviews", get(list_assigned_interviews))
        .route("/interviews/{id}/status", put(update_interview_status))
}
