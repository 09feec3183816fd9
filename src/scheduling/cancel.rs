use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::booking::{ensure_can_manage, load_interview};
use super::notify::{self, Notice};
use crate::app_state::AppState;
use crate::db::{Interview, InterviewStatus, NotificationType, User};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

pub async fn cancel_booking(
    state: &AppState,
    actor: &User,
    interview_id: Uuid,
    reason: Option<String>,
) -> AppResult<Interview> {
    let current = load_interview(&state.repos, interview_id).await?;
    ensure_can_manage(actor, &current)?;
    let cancelled = apply_cancel(state, actor, current, reason).await?;
    notify_cancelled(state, actor, &cancelled).await;
    Ok(cancelled)
}

/// Marks the booking cancelled, then frees the slot recorded in its
/// metadata. An already cancelled booking is rejected before any write, so
/// a slot is never released twice.
pub(crate) async fn apply_cancel(
    state: &AppState,
    actor: &User,
    current: Interview,
    reason: Option<String>,
) -> AppResult<Interview> {
    match current.status {
        InterviewStatus::Cancelled => {
            return Err(AppError::BadRequest(
                "Interview is already cancelled".to_string(),
            ))
        }
        InterviewStatus::Completed => {
            return Err(AppError::BadRequest(
                "Completed interviews cannot be cancelled".to_string(),
            ))
        }
        _ => {}
    }

    let mut next = current;
    next.status = InterviewStatus::Cancelled;
    next.cancelled_at = Some(state.clock.now());
    next.cancelled_by = Some(actor.id);
    next.cancellation_reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let saved = state.repos.interviews.update_interview(&next).await?;

    if let Some(slot_id) = saved.metadata.slot_id() {
        match state.repos.slots.release_slot(slot_id, saved.id).await {
            Ok(Some(_)) => info!(%slot_id, interview_id = %saved.id, "slot released by cancellation"),
            Ok(None) => warn!(%slot_id, interview_id = %saved.id, "cancelled interview did not hold its slot"),
            // The cancellation itself is already stored.
            Err(err) => error!(%slot_id, interview_id = %saved.id, error = %err, "failed to release slot"),
        }
    }

    info!(interview_id = %saved.id, cancelled_by = %actor.id, "interview cancelled");
    Ok(saved)
}

pub(crate) async fn notify_cancelled(state: &AppState, actor: &User, interview: &Interview) {
    let message = match &interview.cancellation_reason {
        Some(reason) => format!(
            "The {} interview on {} was cancelled: {}",
            interview.mode,
            notify::when(interview),
            reason
        ),
        None => format!(
            "The {} interview on {} was cancelled",
            interview.mode,
            notify::when(interview)
        ),
    };
    let notice = Notice::new(NotificationType::InterviewCancelled, "Interview cancelled", message);
    notify::dispatch(state, notify::participants(interview), actor.id, interview, notice).await;
}
