use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::{ApiResponse, AppJson, AppPath, AppQuery};
use crate::app_state::AppState;
use crate::db::{Interview, InterviewFilter, InterviewMode, InterviewStatus, UserRole};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::scheduling::booking::{load_interview, parse_date};
use crate::scheduling::cancel::{self, CancelRequest};
use crate::scheduling::status::{self, AdminUpdateRequest};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminInterviewQuery {
    pub status: Option<InterviewStatus>,
    pub mode: Option<InterviewMode>,
    pub user_id: Option<Uuid>,
    pub interviewer_id: Option<Uuid>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl AdminInterviewQuery {
    fn into_filter(self) -> AppResult<InterviewFilter> {
        Ok(InterviewFilter {
            user_id: self.user_id,
            interviewer_id: self.interviewer_id,
            status: self.status,
            mode: self.mode,
            from: self.from.as_deref().map(parse_date).transpose()?,
            to: self.to.as_deref().map(parse_date).transpose()?,
        })
    }
}

pub async fn list_interviews(
    State(state): State<AppState>,
    auth: AuthUser,
    AppQuery(query): AppQuery<AdminInterviewQuery>,
) -> AppResult<ApiResponse<Vec<Interview>>> {
    auth.require(&[UserRole::Admin])?;
    let filter = query.into_filter()?;
    let interviews = state.repos.interviews.list_interviews(&filter).await?;
    Ok(ApiResponse::ok(interviews))
}

pub async fn get_interview(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<ApiResponse<Interview>> {
    auth.require(&[UserRole::Admin])?;
    let interview = load_interview(&state.repos, id).await?;
    Ok(ApiResponse::ok(interview))
}

pub async fn update_interview(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<AdminUpdateRequest>,
) -> AppResult<ApiResponse<Interview>> {
    let admin = auth.require(&[UserRole::Admin])?;
    payload.validate()?;
    let interview = status::admin_update_interview(&state, admin, id, payload).await?;
    Ok(ApiResponse::ok(interview).with_message("Interview updated"))
}

pub async fn admin_cancel_interview(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<CancelRequest>,
) -> AppResult<ApiResponse<Interview>> {
    let admin = auth.require(&[UserRole::Admin])?;
    payload.validate()?;
    let interview = cancel::cancel_booking(&state, admin, id, payload.reason).await?;
    Ok(ApiResponse::ok(interview).with_message("Interview cancelled"))
}
