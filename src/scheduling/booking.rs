use serde::Deserialize;
use time::Date;
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::calendar::parse_calendar_date;
use super::notify::{self, Notice};
use super::time_label::TimeOfDay;
use super::window::BookingWindow;
use crate::app_state::AppState;
use crate::db::{
    new_ai_session_id, AvailableSlot, ConsentFlags, Interview, InterviewMetadata, InterviewMode,
    InterviewStatus, MatchingStatus, NotificationType, Repositories, User, UserRole,
    ALLOWED_DURATIONS,
};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub mode: InterviewMode,
    pub scheduled_date: String,
    pub time_slot: String,
    pub duration: i32,
    #[validate(
        length(min = 1, max = 64, message = "language is required"),
        custom(function = "not_blank", message = "language is required")
    )]
    pub language: String,
    #[validate(length(max = 64))]
    pub difficulty: Option<String>,
    #[validate(length(max = 128))]
    pub focus_area: Option<String>,
    pub consent_flags: Option<ConsentFlags>,
    pub slot_id: Option<Uuid>,
    pub interviewer_id: Option<Uuid>,
}

/// Rejects values that are empty once surrounding whitespace is removed.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> AppResult<Date> {
    parse_calendar_date(raw).map_err(|err| AppError::BadRequest(err.to_string()))
}

pub(crate) fn parse_time(raw: &str) -> AppResult<TimeOfDay> {
    raw.parse::<TimeOfDay>()
        .map_err(|err| AppError::BadRequest(err.to_string()))
}

pub(crate) fn ensure_duration(duration: i32) -> AppResult<()> {
    if ALLOWED_DURATIONS.contains(&duration) {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "duration must be one of 15, 30, 45 or 60 minutes".to_string(),
        ))
    }
}

pub(crate) fn ensure_bookable(state: &AppState, date: Date, time: TimeOfDay) -> AppResult<()> {
    check_window(&state.window, date, time, state.clock.now())
}

fn check_window(
    window: &BookingWindow,
    date: Date,
    time: TimeOfDay,
    now: time::OffsetDateTime,
) -> AppResult<()> {
    window
        .check(date, time, now)
        .map_err(|violation| AppError::BadRequest(violation.message()))
}

pub(crate) async fn load_interview(repos: &Repositories, interview_id: Uuid) -> AppResult<Interview> {
    repos
        .interviews
        .get_interview(interview_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Interview not found".to_string()))
}

/// Trainees may only act on their own bookings; admins on any.
pub(crate) fn ensure_can_manage(actor: &User, interview: &Interview) -> AppResult<()> {
    match actor.role {
        UserRole::Admin => Ok(()),
        UserRole::Trainee if interview.user_id == actor.id => Ok(()),
        _ => Err(AppError::Forbidden(
            "You can only manage your own interviews".to_string(),
        )),
    }
}

/// Trainee double-booking guard across every mode.
pub(crate) async fn ensure_trainee_free(
    repos: &Repositories,
    user_id: Uuid,
    date: Date,
    time: TimeOfDay,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let existing = repos
        .interviews
        .find_active_for_user_at(user_id, date, time, exclude)
        .await?;
    match existing {
        Some(_) => Err(AppError::BadRequest(
            "You already have an interview booked at this time".to_string(),
        )),
        None => Ok(()),
    }
}

/// Self-serve modes share one timeline per mode.
pub(crate) async fn ensure_mode_time_free(
    repos: &Repositories,
    mode: InterviewMode,
    date: Date,
    time: TimeOfDay,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let existing = repos
        .interviews
        .find_active_in_mode_at(mode, date, time, exclude)
        .await?;
    match existing {
        Some(_) => Err(AppError::BadRequest(
            "This time slot is no longer available".to_string(),
        )),
        None => Ok(()),
    }
}

pub(crate) async fn load_approved_interviewer(
    repos: &Repositories,
    interviewer_id: Uuid,
) -> AppResult<User> {
    let interviewer = repos
        .users
        .get_user(interviewer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Interviewer not found".to_string()))?;
    if interviewer.role != UserRole::Interviewer {
        return Err(AppError::BadRequest(
            "Selected user is not an interviewer".to_string(),
        ));
    }
    if !interviewer.is_approved_interviewer() {
        return Err(AppError::BadRequest(
            "Selected interviewer is not approved".to_string(),
        ));
    }
    Ok(interviewer)
}

/// Re-checks a client supplied slot against the requested booking.
pub(crate) fn ensure_slot_matches(
    slot: AvailableSlot,
    date: Date,
    time: TimeOfDay,
    interviewer_id: Uuid,
) -> AppResult<AvailableSlot> {
    let matches = slot.mode == InterviewMode::Live
        && slot.date == date
        && slot.time == time
        && slot.interviewer_id == Some(interviewer_id);
    if !matches {
        return Err(AppError::BadRequest(
            "Slot details do not match the requested booking".to_string(),
        ));
    }
    if slot.is_booked {
        return Err(AppError::BadRequest("Slot already booked".to_string()));
    }
    Ok(slot)
}

pub(crate) async fn get_slot(repos: &Repositories, slot_id: Uuid) -> AppResult<AvailableSlot> {
    repos
        .slots
        .get_slot(slot_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Slot not found".to_string()))
}

/// Finds the open live slot for a booking: by id when the client sent one,
/// otherwise by `(interviewer, date, time)`.
pub async fn resolve_live_slot(
    repos: &Repositories,
    slot_id: Option<Uuid>,
    date: Date,
    time: TimeOfDay,
    interviewer_id: Uuid,
) -> AppResult<AvailableSlot> {
    if let Some(slot_id) = slot_id {
        let slot = get_slot(repos, slot_id).await?;
        return ensure_slot_matches(slot, date, time, interviewer_id);
    }

    match repos
        .slots
        .find_slot_at(interviewer_id, date, time, InterviewMode::Live)
        .await?
    {
        Some(slot) if !slot.is_booked => Ok(slot),
        Some(_) => Err(AppError::BadRequest("Slot already booked".to_string())),
        None => Err(AppError::BadRequest(
            "No available slot for the selected interviewer and time".to_string(),
        )),
    }
}

/// Conditional claim. Losing the race is a conflict, not a silent overwrite.
pub(crate) async fn claim_slot(
    repos: &Repositories,
    slot_id: Uuid,
    interview_id: Uuid,
) -> AppResult<AvailableSlot> {
    repos
        .slots
        .claim_slot(slot_id, interview_id)
        .await?
        .ok_or_else(|| {
            info!(%slot_id, %interview_id, "slot claim lost to a concurrent booking");
            AppError::Conflict("Slot was just booked by someone else".to_string())
        })
}

/// Undo for a claim whose booking write failed. Never fails the request.
pub(crate) async fn release_quietly(repos: &Repositories, slot_id: Uuid, interview_id: Uuid) {
    match repos.slots.release_slot(slot_id, interview_id).await {
        Ok(Some(_)) => info!(%slot_id, %interview_id, "slot released"),
        Ok(None) => warn!(%slot_id, %interview_id, "slot was not held by this interview"),
        Err(err) => warn!(
            %slot_id,
            %interview_id,
            error = %err,
            "failed to release slot; it stays booked without a booking"
        ),
    }
}

pub(crate) fn meeting_link(state: &AppState, interview_id: Uuid) -> String {
    format!(
        "{}/{}",
        state.env.booking.meeting_base_url.trim_end_matches('/'),
        interview_id.simple()
    )
}

pub async fn create_booking(
    state: &AppState,
    trainee: &User,
    request: CreateBookingRequest,
) -> AppResult<Interview> {
    let repos = &state.repos;
    let date = parse_date(&request.scheduled_date)?;
    let time = parse_time(&request.time_slot)?;
    ensure_duration(request.duration)?;
    ensure_bookable(state, date, time)?;

    let interview_id = Uuid::now_v7();

    let (interviewer_id, metadata, slot) = match request.mode {
        InterviewMode::Live => {
            let interviewer_id = request.interviewer_id.ok_or_else(|| {
                AppError::BadRequest("interviewerId is required for live interviews".to_string())
            })?;
            let interviewer = load_approved_interviewer(repos, interviewer_id).await?;
            let slot = resolve_live_slot(repos, request.slot_id, date, time, interviewer.id).await?;
            let metadata = InterviewMetadata::Live {
                slot_id: slot.id,
                meeting_link: meeting_link(state, interview_id),
            };
            (Some(interviewer.id), metadata, Some(slot))
        }
        InterviewMode::Ai => {
            ensure_mode_time_free(repos, InterviewMode::Ai, date, time, None).await?;
            let metadata = InterviewMetadata::Ai {
                ai_session_id: new_ai_session_id(),
            };
            (None, metadata, None)
        }
        InterviewMode::Peer => {
            ensure_mode_time_free(repos, InterviewMode::Peer, date, time, None).await?;
            let metadata = InterviewMetadata::Peer {
                matching_status: MatchingStatus::Pending,
            };
            (None, metadata, None)
        }
        InterviewMode::Family => {
            ensure_mode_time_free(repos, InterviewMode::Family, date, time, None).await?;
            let metadata = InterviewMetadata::Family {
                meeting_link: meeting_link(state, interview_id),
            };
            (None, metadata, None)
        }
    };

    ensure_trainee_free(repos, trainee.id, date, time, None).await?;

    let claimed = match slot {
        Some(slot) => Some(claim_slot(repos, slot.id, interview_id).await?),
        None => None,
    };

    let now = state.clock.now();
    let draft = Interview {
        id: interview_id,
        user_id: trainee.id,
        interviewer_id,
        mode: request.mode,
        scheduled_date: date,
        time_slot: time,
        duration: request.duration,
        language: request.language.trim().to_string(),
        difficulty: request.difficulty,
        focus_area: request.focus_area,
        status: InterviewStatus::Scheduled,
        consent: request.consent_flags.unwrap_or_default(),
        metadata,
        notes: None,
        cancellation_reason: None,
        cancelled_at: None,
        cancelled_by: None,
        started_at: None,
        completed_at: None,
        created_at: now,
        updated_at: now,
    };

    let interview = match repos.interviews.insert_interview(&draft).await {
        Ok(interview) => interview,
        Err(err) => {
            if let Some(slot) = &claimed {
                release_quietly(repos, slot.id, interview_id).await;
            }
            return Err(err.into());
        }
    };

    if let InterviewMetadata::Ai { ai_session_id } = &interview.metadata {
        if let Err(err) = repos
            .ai_sessions
            .create_ai_session(ai_session_id, interview.id, trainee.id)
            .await
        {
            warn!(interview_id = %interview.id, error = %err, "failed to create AI session record");
        }
    }

    info!(
        interview_id = %interview.id,
        user_id = %trainee.id,
        mode = %interview.mode,
        date = %interview.scheduled_date,
        time = %interview.time_slot,
        "interview booked"
    );

    let recipients = notify::admins_and_interviewer(state, &interview).await;
    let notice = Notice::new(
        NotificationType::InterviewBooked,
        "New interview booked",
        format!(
            "{} booked a {} interview on {}",
            trainee.name,
            interview.mode,
            notify::when(&interview)
        ),
    );
    notify::dispatch(state, recipients, trainee.id, &interview, notice).await;

    Ok(interview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};
    use time::UtcOffset;

    #[test]
    fn whitespace_only_language_fails_validation() {
        let request: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "mode": "ai",
            "scheduledDate": "2025-01-16",
            "timeSlot": "09:00 AM",
            "duration": 30,
            "language": "   ",
        }))
        .unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("language"));
        assert!(not_blank(" English ").is_ok());
    }

    #[test]
    fn only_enumerated_durations_are_accepted() {
        for ok in [15, 30, 45, 60] {
            assert!(ensure_duration(ok).is_ok());
        }
        for bad in [0, 20, 90, -15] {
            assert!(matches!(ensure_duration(bad), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn window_violations_are_bad_requests() {
        let window = BookingWindow::new(30, UtcOffset::UTC);
        let now = datetime!(2025-01-15 14:45 UTC);
        let three_pm = TimeOfDay::from_hm(15, 0).unwrap();

        let err = check_window(&window, date!(2025 - 01 - 15), three_pm, now).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = check_window(&window, date!(2025 - 01 - 14), three_pm, now).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(check_window(&window, date!(2025 - 01 - 16), three_pm, now).is_ok());
    }

    fn slot(interviewer_id: Uuid, booked: bool) -> AvailableSlot {
        let now = datetime!(2025-01-10 09:00 UTC);
        AvailableSlot {
            id: Uuid::new_v4(),
            interviewer_id: Some(interviewer_id),
            date: date!(2025 - 01 - 15),
            time: TimeOfDay::from_hm(9, 0).unwrap(),
            mode: InterviewMode::Live,
            is_booked: booked,
            interview_id: booked.then(Uuid::new_v4),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn stale_slot_details_are_rejected() {
        let interviewer = Uuid::new_v4();
        let nine = TimeOfDay::from_hm(9, 0).unwrap();
        let ten = TimeOfDay::from_hm(10, 0).unwrap();

        assert!(ensure_slot_matches(slot(interviewer, false), date!(2025 - 01 - 15), nine, interviewer).is_ok());

        let err = ensure_slot_matches(slot(interviewer, false), date!(2025 - 01 - 15), ten, interviewer)
            .unwrap_err();
        assert_eq!(err.to_string(), "Slot details do not match the requested booking");

        let err = ensure_slot_matches(slot(interviewer, false), date!(2025 - 01 - 15), nine, Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = ensure_slot_matches(slot(interviewer, true), date!(2025 - 01 - 15), nine, interviewer)
            .unwrap_err();
        assert_eq!(err.to_string(), "Slot already booked");
    }
}
