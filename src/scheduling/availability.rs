use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use time::Date;
use tracing::{debug, info};
use uuid::Uuid;

use super::booking::{ensure_bookable, parse_date, parse_time};
use super::calendar::serde_date;
use super::time_label::{default_time_catalogue, TimeOfDay};
use crate::app_state::AppState;
use crate::db::{
    AvailableSlot, DatabaseError, InterviewMode, NewAvailableSlot, PublicIdentity, SlotFilter,
    User, UserRole,
};
use crate::error::{AppError, AppResult};

/// One bookable start time as shown to trainees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotCandidate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub time: TimeOfDay,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interviewer: Option<PublicIdentity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySlots {
    #[serde(with = "serde_date")]
    pub date: Date,
    pub mode: InterviewMode,
    pub slots: Vec<SlotCandidate>,
}

/// Candidate start times for `(date, mode)`.
///
/// Live mode lists every open interviewer slot; the self-serve modes list the
/// fixed catalogue with taken times marked unavailable. Past days are empty
/// and today's times inside the buffer are dropped.
pub async fn available_slots(state: &AppState, date: Date, mode: InterviewMode) -> AppResult<DaySlots> {
    let now = state.clock.now();
    if state.window.is_past_day(date, now) {
        return Ok(DaySlots {
            date,
            mode,
            slots: Vec::new(),
        });
    }

    let mut slots = match mode {
        InterviewMode::Live => {
            let open = state.repos.slots.list_open_slots(date, InterviewMode::Live).await?;
            let mut interviewers: HashMap<Uuid, Option<User>> = HashMap::new();
            let mut candidates = Vec::with_capacity(open.len());

            for slot in open {
                if !state.window.admits(date, slot.time, now) {
                    continue;
                }
                let Some(interviewer_id) = slot.interviewer_id else {
                    continue;
                };
                if !interviewers.contains_key(&interviewer_id) {
                    let user = state.repos.users.get_user(interviewer_id).await?;
                    interviewers.insert(interviewer_id, user);
                }
                match interviewers.get(&interviewer_id).and_then(Option::as_ref) {
                    Some(user) if user.is_approved_interviewer() => candidates.push(SlotCandidate {
                        id: Some(slot.id),
                        time: slot.time,
                        available: true,
                        interviewer: Some(PublicIdentity::from(user)),
                    }),
                    _ => debug!(slot_id = %slot.id, %interviewer_id, "skipping slot of unavailable interviewer"),
                }
            }
            candidates
        }
        other => {
            let taken: HashSet<TimeOfDay> = state
                .repos
                .interviews
                .booked_times_in_mode(other, date)
                .await?
                .into_iter()
                .collect();
            default_time_catalogue()
                .into_iter()
                .filter(|time| state.window.admits(date, *time, now))
                .map(|time| SlotCandidate {
                    id: None,
                    time,
                    available: !taken.contains(&time),
                    interviewer: None,
                })
                .collect()
        }
    };

    slots.sort_by_key(|candidate| candidate.time);
    Ok(DaySlots { date, mode, slots })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    pub mode: Option<InterviewMode>,
    pub include_booked: Option<bool>,
    /// Admin only: narrow the listing to one interviewer.
    pub interviewer_id: Option<Uuid>,
}

pub async fn list_interviewer_slots(
    state: &AppState,
    caller: &User,
    query: AvailabilityQuery,
) -> AppResult<Vec<AvailableSlot>> {
    let interviewer_id = match caller.role {
        UserRole::Interviewer => Some(caller.id),
        UserRole::Admin => query.interviewer_id,
        UserRole::Trainee => {
            return Err(AppError::Forbidden(
                "Only interviewers and admins can view availability".to_string(),
            ))
        }
    };
    let filter = SlotFilter {
        interviewer_id,
        date: query.date.as_deref().map(parse_date).transpose()?,
        mode: query.mode,
        include_booked: query.include_booked.unwrap_or(false),
    };
    Ok(state.repos.slots.list_slots(&filter).await?)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAvailabilityRequest {
    pub date: String,
    pub time: String,
    pub mode: Option<InterviewMode>,
}

fn duplicate_slot() -> AppError {
    AppError::BadRequest("You already have availability at this time".to_string())
}

pub async fn add_availability(
    state: &AppState,
    interviewer: &User,
    request: AddAvailabilityRequest,
) -> AppResult<AvailableSlot> {
    if !interviewer.is_approved_interviewer() {
        return Err(AppError::Forbidden(
            "Only approved interviewers can publish availability".to_string(),
        ));
    }
    let date = parse_date(&request.date)?;
    let time = parse_time(&request.time)?;
    let mode = request.mode.unwrap_or(InterviewMode::Live);
    ensure_bookable(state, date, time)?;

    if state
        .repos
        .slots
        .find_slot_at(interviewer.id, date, time, mode)
        .await?
        .is_some()
    {
        return Err(duplicate_slot());
    }

    let slot = state
        .repos
        .slots
        .insert_slot(NewAvailableSlot {
            interviewer_id: interviewer.id,
            date,
            time,
            mode,
        })
        .await
        .map_err(|err| match err {
            DatabaseError::Duplicate(_) => duplicate_slot(),
            other => AppError::from(other),
        })?;

    info!(slot_id = %slot.id, interviewer_id = %interviewer.id, %date, %time, "availability added");
    Ok(slot)
}

pub async fn delete_availability(state: &AppState, interviewer: &User, slot_id: Uuid) -> AppResult<()> {
    let slot = state
        .repos
        .slots
        .get_slot(slot_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Slot not found".to_string()))?;

    if slot.interviewer_id != Some(interviewer.id) {
        return Err(AppError::Forbidden(
            "You can only delete your own availability".to_string(),
        ));
    }
    if slot.is_booked {
        return Err(AppError::BadRequest("Cannot delete a booked slot".to_string()));
    }
    // Conditional delete; a booking may have landed since the read above.
    if !state.repos.slots.delete_open_slot(slot_id).await? {
        return Err(AppError::BadRequest("Cannot delete a booked slot".to_string()));
    }

    info!(%slot_id, interviewer_id = %interviewer.id, "availability deleted");
    Ok(())
}
