use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::booking::{ensure_duration, load_interview, not_blank};
use super::cancel::{apply_cancel, notify_cancelled};
use super::notify::{self, Notice};
use super::reschedule::{apply_reschedule, notify_rescheduled, RescheduleRequest};
use crate::app_state::AppState;
use crate::db::{Interview, InterviewStatus, NotificationType, User};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: InterviewStatus,
}

/// Partial admin edit. Schedule fields are routed through rescheduling and
/// `status: cancelled` through cancellation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateRequest {
    pub status: Option<InterviewStatus>,
    pub duration: Option<i32>,
    #[validate(length(min = 1, max = 64), custom(function = "not_blank"))]
    pub language: Option<String>,
    #[validate(length(max = 64))]
    pub difficulty: Option<String>,
    #[validate(length(max = 128))]
    pub focus_area: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(max = 500))]
    pub cancellation_reason: Option<String>,
    pub scheduled_date: Option<String>,
    pub time_slot: Option<String>,
    pub slot_id: Option<Uuid>,
    pub interviewer_id: Option<Uuid>,
}

impl AdminUpdateRequest {
    fn schedule_change(&self) -> RescheduleRequest {
        RescheduleRequest {
            scheduled_date: self.scheduled_date.clone(),
            time_slot: self.time_slot.clone(),
            slot_id: self.slot_id,
            interviewer_id: self.interviewer_id,
        }
    }

    fn apply_details(&self, interview: &mut Interview) -> AppResult<()> {
        if let Some(duration) = self.duration {
            ensure_duration(duration)?;
            interview.duration = duration;
        }
        if let Some(language) = &self.language {
            interview.language = language.trim().to_string();
        }
        if let Some(difficulty) = &self.difficulty {
            interview.difficulty = Some(difficulty.clone());
        }
        if let Some(focus_area) = &self.focus_area {
            interview.focus_area = Some(focus_area.clone());
        }
        if let Some(notes) = &self.notes {
            interview.notes = Some(notes.clone());
        }
        Ok(())
    }
}

/// Stamps `started_at`/`completed_at` the first time a status is reached.
fn move_to(interview: &mut Interview, status: InterviewStatus, now: time::OffsetDateTime) {
    interview.status = status;
    match status {
        InterviewStatus::InProgress => {
            interview.started_at.get_or_insert(now);
        }
        InterviewStatus::Completed => {
            interview.completed_at.get_or_insert(now);
        }
        _ => {}
    }
}

/// Status change by the interviewer assigned to the booking.
pub async fn update_interview_status(
    state: &AppState,
    interviewer: &User,
    interview_id: Uuid,
    status: InterviewStatus,
) -> AppResult<Interview> {
    let mut interview = load_interview(&state.repos, interview_id).await?;
    if interview.interviewer_id != Some(interviewer.id) {
        return Err(AppError::Forbidden(
            "You are not assigned to this interview".to_string(),
        ));
    }
    if matches!(
        interview.status,
        InterviewStatus::Cancelled | InterviewStatus::Completed
    ) {
        return Err(AppError::BadRequest(format!(
            "Interview is already {}",
            interview.status
        )));
    }
    if !matches!(
        status,
        InterviewStatus::InProgress | InterviewStatus::Completed | InterviewStatus::NoShow
    ) {
        return Err(AppError::BadRequest(
            "Status must be in_progress, completed or no_show".to_string(),
        ));
    }

    move_to(&mut interview, status, state.clock.now());
    let saved = state.repos.interviews.update_interview(&interview).await?;
    info!(interview_id = %saved.id, status = %saved.status, "interview status changed");

    notify_status(state, interviewer, &saved).await;
    Ok(saved)
}

pub async fn admin_update_interview(
    state: &AppState,
    admin: &User,
    interview_id: Uuid,
    request: AdminUpdateRequest,
) -> AppResult<Interview> {
    let current = load_interview(&state.repos, interview_id).await?;
    let schedule = request.schedule_change();

    let mut edited = current.clone();
    request.apply_details(&mut edited)?;

    if request.status == Some(InterviewStatus::Cancelled) {
        if !schedule.is_empty() {
            return Err(AppError::BadRequest(
                "Cannot reschedule and cancel in the same request".to_string(),
            ));
        }
        let cancelled = apply_cancel(state, admin, edited, request.cancellation_reason).await?;
        notify_cancelled(state, admin, &cancelled).await;
        return Ok(cancelled);
    }

    if !schedule.is_empty() {
        if request.status.is_some() {
            return Err(AppError::BadRequest(
                "Status cannot be changed together with the schedule".to_string(),
            ));
        }
        let moved = apply_reschedule(state, edited, schedule).await?;
        notify_rescheduled(state, admin, &moved).await;
        return Ok(moved);
    }

    if let Some(status) = request.status {
        if current.status == InterviewStatus::Cancelled {
            return Err(AppError::BadRequest(
                "Cancelled interviews cannot be reopened".to_string(),
            ));
        }
        move_to(&mut edited, status, state.clock.now());
    }

    let saved = state.repos.interviews.update_interview(&edited).await?;
    info!(interview_id = %saved.id, admin_id = %admin.id, "interview updated by admin");

    if saved.status != current.status {
        notify_status(state, admin, &saved).await;
    }
    Ok(saved)
}

async fn notify_status(state: &AppState, actor: &User, interview: &Interview) {
    let notice = Notice::new(
        NotificationType::InterviewStatusChanged,
        "Interview status updated",
        format!(
            "The {} interview on {} is now {}",
            interview.mode,
            notify::when(interview),
            interview.status
        ),
    );
    notify::dispatch(state, notify::participants(interview), actor.id, interview, notice).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn admin_request_splits_out_schedule_fields() {
        let request: AdminUpdateRequest = serde_json::from_value(serde_json::json!({
            "notes": "bring a whiteboard",
            "timeSlot": "03:00 PM",
        }))
        .unwrap();
        let schedule = request.schedule_change();
        assert!(!schedule.is_empty());
        assert_eq!(schedule.time_slot.as_deref(), Some("03:00 PM"));
        assert!(AdminUpdateRequest::default().schedule_change().is_empty());
    }

    #[test]
    fn lifecycle_timestamps_are_stamped_once() {
        let first = datetime!(2030-01-01 10:00 UTC);
        let later = datetime!(2030-01-01 11:00 UTC);
        let mut interview = fixture();

        move_to(&mut interview, InterviewStatus::InProgress, first);
        move_to(&mut interview, InterviewStatus::InProgress, later);
        assert_eq!(interview.started_at, Some(first));

        move_to(&mut interview, InterviewStatus::Completed, later);
        assert_eq!(interview.completed_at, Some(later));
        assert_eq!(interview.status, InterviewStatus::Completed);
    }

    fn fixture() -> Interview {
        use crate::db::{ConsentFlags, InterviewMetadata, InterviewMode, MatchingStatus};
        use crate::scheduling::time_label::TimeOfDay;
        use time::macros::date;

        let created = datetime!(2029-12-31 09:00 UTC);
        Interview {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            interviewer_id: None,
            mode: InterviewMode::Peer,
            scheduled_date: date!(2030 - 01 - 01),
            time_slot: TimeOfDay::from_hm(10, 0).unwrap(),
            duration: 30,
            language: "English".into(),
            difficulty: None,
            focus_area: None,
            status: InterviewStatus::Scheduled,
            consent: ConsentFlags::default(),
            metadata: InterviewMetadata::Peer {
                matching_status: MatchingStatus::Pending,
            },
            notes: None,
            cancellation_reason: None,
            cancelled_at: None,
            cancelled_by: None,
            started_at: None,
            completed_at: None,
            created_at: created,
            updated_at: created,
        }
    }
}
