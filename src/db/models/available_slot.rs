use serde::Serialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::interview::InterviewMode;
use crate::scheduling::calendar::serde_date;
use crate::scheduling::time_label::TimeOfDay;

/// An interviewer's published opening.
///
/// `is_booked` and `interview_id` always move together; `version` is bumped
/// by every claim or release.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlot {
    pub id: Uuid,
    pub interviewer_id: Option<Uuid>,
    #[sqlx(rename = "slot_date")]
    #[serde(with = "serde_date")]
    pub date: Date,
    #[sqlx(rename = "slot_time")]
    pub time: TimeOfDay,
    pub mode: InterviewMode,
    pub is_booked: bool,
    pub interview_id: Option<Uuid>,
    pub version: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAvailableSlot {
    pub interviewer_id: Uuid,
    pub date: Date,
    pub time: TimeOfDay,
    pub mode: InterviewMode,
}

#[derive(Debug, Clone, Default)]
pub struct SlotFilter {
    pub interviewer_id: Option<Uuid>,
    pub date: Option<Date>,
    pub mode: Option<InterviewMode>,
    pub include_booked: bool,
}

impl SlotFilter {
    pub fn matches(&self, slot: &AvailableSlot) -> bool {
        self.interviewer_id
            .map_or(true, |id| slot.interviewer_id == Some(id))
            && self.date.map_or(true, |d| slot.date == d)
            && self.mode.map_or(true, |m| slot.mode == m)
            && (self.include_booked || !slot.is_booked)
    }
}
