use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::{ApiResponse, AppJson, AppPath, AppQuery};
use crate::app_state::AppState;
use crate::db::{Interview, InterviewFilter, InterviewMode, InterviewStatus, UserRole};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::scheduling::availability::{self, DaySlots};
use crate::scheduling::booking::{self, parse_date, CreateBookingRequest};
use crate::scheduling::cancel::{self, CancelRequest};
use crate::scheduling::reschedule::{self, RescheduleRequest};

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: String,
    pub mode: InterviewMode,
}

#[derive(Debug, Default, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<InterviewStatus>,
    pub mode: Option<InterviewMode>,
}

pub async fn list_slots(
    State(state): State<AppState>,
    _auth: AuthUser,
    AppQuery(query): AppQuery<SlotsQuery>,
) -> AppResult<ApiResponse<DaySlots>> {
    let date = parse_date(&query.date)?;
    let slots = availability::available_slots(&state, date, query.mode).await?;
    Ok(ApiResponse::ok(slots))
}

pub async fn create_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(payload): AppJson<CreateBookingRequest>,
) -> AppResult<ApiResponse<Interview>> {
    let trainee = auth.require(&[UserRole::Trainee])?;
    payload.validate()?;
    let interview = booking::create_booking(&state, trainee, payload).await?;
    Ok(ApiResponse::created(interview).with_message("Interview booked successfully"))
}

/// The caller's own bookings: as trainee, as assigned interviewer, or all
/// of them for admins.
pub async fn list_bookings(
    State(state): State<AppState>,
    auth: AuthUser,
    AppQuery(query): AppQuery<BookingListQuery>,
) -> AppResult<ApiResponse<Vec<Interview>>> {
    let mut filter = InterviewFilter {
        status: query.status,
        mode: query.mode,
        ..InterviewFilter::default()
    };
    match auth.role() {
        UserRole::Trainee => filter.user_id = Some(auth.id()),
        UserRole::Interviewer => filter.interviewer_id = Some(auth.id()),
        UserRole::Admin => {}
    }
    let interviews = state.repos.interviews.list_interviews(&filter).await?;
    Ok(ApiResponse::ok(interviews))
}

pub async fn get_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<ApiResponse<Interview>> {
    let interview = booking::load_interview(&state.repos, id).await?;
    let visible = match auth.role() {
        UserRole::Admin => true,
        UserRole::Trainee => interview.user_id == auth.id(),
        UserRole::Interviewer => interview.interviewer_id == Some(auth.id()),
    };
    if !visible {
        return Err(AppError::Forbidden(
            "You do not have access to this interview".to_string(),
        ));
    }
    Ok(ApiResponse::ok(interview))
}

pub async fn reschedule_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<RescheduleRequest>,
) -> AppResult<ApiResponse<Interview>> {
    let actor = auth.require(&[UserRole::Trainee, UserRole::Admin])?;
    let interview = reschedule::reschedule_booking(&state, actor, id, payload).await?;
    Ok(ApiResponse::ok(interview).with_message("Interview rescheduled successfully"))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<CancelRequest>,
) -> AppResult<ApiResponse<Interview>> {
    let actor = auth.require(&[UserRole::Trainee, UserRole::Admin])?;
    payload.validate()?;
    let interview = cancel::cancel_booking(&state, actor, id, payload.reason).await?;
    Ok(ApiResponse::ok(interview).with_message("Interview cancelled successfully"))
}
