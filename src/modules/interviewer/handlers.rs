use axum::extract::State;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{ApiResponse, AppJson, AppPath, AppQuery};
use crate::app_state::AppState;
use crate::db::{AvailableSlot, Interview, InterviewFilter, UserRole};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::modules::bookings::handlers::BookingListQuery;
use crate::scheduling::availability::{self, AddAvailabilityRequest, AvailabilityQuery};
use crate::scheduling::status::{self, StatusUpdateRequest};

pub async fn list_availability(
    State(state): State<AppState>,
    auth: AuthUser,
    AppQuery(query): AppQuery<AvailabilityQuery>,
) -> AppResult<ApiResponse<Vec<AvailableSlot>>> {
    let caller = auth.require(&[UserRole::Interviewer, UserRole::Admin])?;
    let slots = availability::list_interviewer_slots(&state, caller, query).await?;
    Ok(ApiResponse::ok(slots))
}

pub async fn add_availability(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(payload): AppJson<AddAvailabilityRequest>,
) -> AppResult<ApiResponse<AvailableSlot>> {
    let interviewer = auth.require(&[UserRole::Interviewer])?;
    let slot = availability::add_availability(&state, interviewer, payload).await?;
    Ok(ApiResponse::created(slot).with_message("Availability added"))
}

pub async fn delete_availability(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(slot_id): AppPath<Uuid>,
) -> AppResult<ApiResponse<Value>> {
    let interviewer = auth.require(&[UserRole::Interviewer])?;
    availability::delete_availability(&state, interviewer, slot_id).await?;
    Ok(ApiResponse::ok(json!({ "id": slot_id })).with_message("Availability deleted"))
}

pub async fn list_assigned_interviews(
    State(state): State<AppState>,
    auth: AuthUser,
    AppQuery(query): AppQuery<BookingListQuery>,
) -> AppResult<ApiResponse<Vec<Interview>>> {
    let interviewer = auth.require(&[UserRole::Interviewer])?;
    let filter = InterviewFilter {
        interviewer_id: Some(interviewer.id),
        status: query.status,
        mode: query.mode,
        ..InterviewFilter::default()
    };
    let interviews = state.repos.interviews.list_interviews(&filter).await?;
    Ok(ApiResponse::ok(interviews))
}

pub async fn update_interview_status(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<StatusUpdateRequest>,
) -> AppResult<ApiResponse<Interview>> {
    let interviewer = auth.require(&[UserRole::Interviewer])?;
    let interview = status::update_interview_status(&state, interviewer, id, payload.status).await?;
    Ok(ApiResponse::ok(interview))
}
