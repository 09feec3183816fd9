use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{admin_cancel_interview, get_interview, list_interviews, update_interview};
use crate::app_state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/interviews", get(list_interviews))
        .route("/interviews/{id}", get(get_interview).put(update_interview))
        .route("/interviews/{id}/cancel", post(admin_cancel_interview))
}
