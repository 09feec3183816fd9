use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::booking::{
    claim_slot, ensure_bookable, ensure_can_manage, ensure_mode_time_free, ensure_slot_matches,
    ensure_trainee_free, get_slot, load_approved_interviewer, load_interview, meeting_link,
    parse_date, parse_time, release_quietly, resolve_live_slot,
};
use super::notify::{self, Notice};
use crate::app_state::AppState;
use crate::db::{Interview, InterviewMetadata, InterviewMode, InterviewStatus, NotificationType, User};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub scheduled_date: Option<String>,
    pub time_slot: Option<String>,
    pub slot_id: Option<Uuid>,
    pub interviewer_id: Option<Uuid>,
}

impl RescheduleRequest {
    pub fn is_empty(&self) -> bool {
        self.scheduled_date.is_none()
            && self.time_slot.is_none()
            && self.slot_id.is_none()
            && self.interviewer_id.is_none()
    }
}

pub async fn reschedule_booking(
    state: &AppState,
    actor: &User,
    interview_id: Uuid,
    request: RescheduleRequest,
) -> AppResult<Interview> {
    let current = load_interview(&state.repos, interview_id).await?;
    ensure_can_manage(actor, &current)?;
    let updated = apply_reschedule(state, current, request).await?;
    notify_rescheduled(state, actor, &updated).await;
    Ok(updated)
}

/// Moves a booking to a new date, time or slot and resets it to
/// `scheduled`. Fields already edited on `current` are persisted with it.
pub(crate) async fn apply_reschedule(
    state: &AppState,
    current: Interview,
    request: RescheduleRequest,
) -> AppResult<Interview> {
    let repos = &state.repos;

    if current.status.blocks_reschedule() {
        return Err(AppError::BadRequest(format!(
            "Cannot reschedule an interview that is {}",
            current.status
        )));
    }
    if request.is_empty() {
        return Err(AppError::BadRequest(
            "Provide a new scheduledDate, timeSlot or slotId".to_string(),
        ));
    }

    let requested_date = request.scheduled_date.as_deref().map(parse_date).transpose()?;
    let requested_time = request.time_slot.as_deref().map(parse_time).transpose()?;

    // A bare slotId carries its own date, time and interviewer.
    let hinted_slot = match (current.mode, request.slot_id) {
        (InterviewMode::Live, Some(slot_id)) => Some(get_slot(repos, slot_id).await?),
        _ => None,
    };

    let new_date = requested_date
        .or(hinted_slot.as_ref().map(|slot| slot.date))
        .unwrap_or(current.scheduled_date);
    let new_time = requested_time
        .or(hinted_slot.as_ref().map(|slot| slot.time))
        .unwrap_or(current.time_slot);
    let new_interviewer = request
        .interviewer_id
        .or(hinted_slot.as_ref().and_then(|slot| slot.interviewer_id))
        .or(current.interviewer_id);

    let same_slot = match (request.slot_id, current.metadata.slot_id()) {
        (Some(requested), Some(held)) => requested == held,
        _ => true,
    };
    let unchanged = new_date == current.scheduled_date
        && new_time == current.time_slot
        && (current.mode != InterviewMode::Live
            || (new_interviewer == current.interviewer_id && same_slot));
    if unchanged {
        return Err(AppError::BadRequest(
            "The new schedule is the same as the current one".to_string(),
        ));
    }

    ensure_bookable(state, new_date, new_time)?;
    ensure_trainee_free(repos, current.user_id, new_date, new_time, Some(current.id)).await?;

    let mut next = current.clone();
    next.scheduled_date = new_date;
    next.time_slot = new_time;
    next.status = InterviewStatus::Scheduled;

    if current.mode != InterviewMode::Live {
        ensure_mode_time_free(repos, current.mode, new_date, new_time, Some(current.id)).await?;
        let saved = repos.interviews.update_interview(&next).await?;
        info!(interview_id = %saved.id, date = %saved.scheduled_date, time = %saved.time_slot, "interview rescheduled");
        return Ok(saved);
    }

    let interviewer_id = new_interviewer.ok_or_else(|| {
        AppError::BadRequest("interviewerId is required for live interviews".to_string())
    })?;
    let interviewer = load_approved_interviewer(repos, interviewer_id).await?;
    let slot = match hinted_slot {
        Some(slot) => ensure_slot_matches(slot, new_date, new_time, interviewer.id)?,
        None => resolve_live_slot(repos, None, new_date, new_time, interviewer.id).await?,
    };

    let claimed = claim_slot(repos, slot.id, current.id).await?;

    let link = current
        .metadata
        .meeting_link()
        .map(str::to_string)
        .unwrap_or_else(|| meeting_link(state, current.id));
    next.interviewer_id = Some(interviewer.id);
    next.metadata = InterviewMetadata::Live {
        slot_id: claimed.id,
        meeting_link: link,
    };

    let saved = match repos.interviews.update_interview(&next).await {
        Ok(saved) => saved,
        Err(err) => {
            release_quietly(repos, claimed.id, current.id).await;
            return Err(err.into());
        }
    };

    if let Some(old_slot) = current.metadata.slot_id() {
        release_quietly(repos, old_slot, current.id).await;
    }

    info!(
        interview_id = %saved.id,
        slot_id = %claimed.id,
        interviewer_id = %interviewer.id,
        date = %saved.scheduled_date,
        time = %saved.time_slot,
        "live interview moved to a new slot"
    );
    Ok(saved)
}

pub(crate) async fn notify_rescheduled(state: &AppState, actor: &User, interview: &Interview) {
    let mut recipients = notify::admins_and_interviewer(state, interview).await;
    recipients.push(interview.user_id);
    let notice = Notice::new(
        NotificationType::InterviewRescheduled,
        "Interview rescheduled",
        format!(
            "The {} interview was moved to {}",
            interview.mode,
            notify::when(interview)
        ),
    );
    notify::dispatch(state, recipients, actor.id, interview, notice).await;
}
