use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::scheduling::calendar::serde_date;
use crate::scheduling::time_label::TimeOfDay;

/// Session lengths a trainee may book, in minutes.
pub const ALLOWED_DURATIONS: [i32; 4] = [15, 30, 45, 60];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "interview_mode", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InterviewMode {
    Ai,
    Peer,
    Family,
    Live,
}

impl InterviewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InterviewMode::Ai => "ai",
            InterviewMode::Peer => "peer",
            InterviewMode::Family => "family",
            InterviewMode::Live => "live",
        }
    }
}

impl fmt::Display for InterviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "interview_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl InterviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "scheduled",
            InterviewStatus::InProgress => "in_progress",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
            InterviewStatus::NoShow => "no_show",
        }
    }

    pub fn is_active(self) -> bool {
        self != InterviewStatus::Cancelled
    }

    pub fn blocks_reschedule(self) -> bool {
        matches!(
            self,
            InterviewStatus::Completed | InterviewStatus::Cancelled | InterviewStatus::InProgress
        )
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingStatus {
    Pending,
    Matched,
}

/// Mode specific state attached to a booking.
///
/// Serialized untagged so the wire keeps the flat `metadata` object
/// (`{ "slotId": .., "meetingLink": .. }`); variant order matters for
/// deserialization since `Live` is a superset of `Family`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InterviewMetadata {
    #[serde(rename_all = "camelCase")]
    Live { slot_id: Uuid, meeting_link: String },
    #[serde(rename_all = "camelCase")]
    Ai { ai_session_id: String },
    #[serde(rename_all = "camelCase")]
    Peer { matching_status: MatchingStatus },
    #[serde(rename_all = "camelCase")]
    Family { meeting_link: String },
}

impl InterviewMetadata {
    pub fn slot_id(&self) -> Option<Uuid> {
        match self {
            InterviewMetadata::Live { slot_id, .. } => Some(*slot_id),
            _ => None,
        }
    }

    pub fn meeting_link(&self) -> Option<&str> {
        match self {
            InterviewMetadata::Live { meeting_link, .. }
            | InterviewMetadata::Family { meeting_link } => Some(meeting_link),
            _ => None,
        }
    }

    pub fn mode(&self) -> InterviewMode {
        match self {
            InterviewMetadata::Live { .. } => InterviewMode::Live,
            InterviewMetadata::Ai { .. } => InterviewMode::Ai,
            InterviewMetadata::Peer { .. } => InterviewMode::Peer,
            InterviewMetadata::Family { .. } => InterviewMode::Family,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsentFlags {
    pub recording: bool,
    pub transcription: bool,
    pub share_with_interviewer: bool,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub interviewer_id: Option<Uuid>,
    pub mode: InterviewMode,
    #[serde(with = "serde_date")]
    pub scheduled_date: Date,
    pub time_slot: TimeOfDay,
    pub duration: i32,
    pub language: String,
    pub difficulty: Option<String>,
    pub focus_area: Option<String>,
    pub status: InterviewStatus,
    #[sqlx(json)]
    pub consent: ConsentFlags,
    #[sqlx(json)]
    pub metadata: InterviewMetadata,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub cancelled_at: Option<OffsetDateTime>,
    pub cancelled_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct InterviewFilter {
    pub user_id: Option<Uuid>,
    pub interviewer_id: Option<Uuid>,
    pub status: Option<InterviewStatus>,
    pub mode: Option<InterviewMode>,
    pub from: Option<Date>,
    pub to: Option<Date>,
}

impl InterviewFilter {
    pub fn matches(&self, interview: &Interview) -> bool {
        self.user_id.map_or(true, |id| interview.user_id == id)
            && self
                .interviewer_id
                .map_or(true, |id| interview.interviewer_id == Some(id))
            && self.status.map_or(true, |s| interview.status == s)
            && self.mode.map_or(true, |m| interview.mode == m)
            && self.from.map_or(true, |d| interview.scheduled_date >= d)
            && self.to.map_or(true, |d| interview.scheduled_date <= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_keeps_the_flat_wire_shape() {
        let slot_id = Uuid::nil();
        let live = InterviewMetadata::Live {
            slot_id,
            meeting_link: "https://meet.example/room".into(),
        };
        assert_eq!(
            serde_json::to_value(&live).unwrap(),
            json!({ "slotId": slot_id, "meetingLink": "https://meet.example/room" })
        );

        let peer = InterviewMetadata::Peer {
            matching_status: MatchingStatus::Pending,
        };
        assert_eq!(
            serde_json::to_value(&peer).unwrap(),
            json!({ "matchingStatus": "pending" })
        );
    }

    #[test]
    fn metadata_decodes_to_the_right_variant() {
        let family: InterviewMetadata =
            serde_json::from_value(json!({ "meetingLink": "https://meet.example/x" })).unwrap();
        assert_eq!(family.mode(), InterviewMode::Family);
        assert_eq!(family.slot_id(), None);

        let live: InterviewMetadata = serde_json::from_value(
            json!({ "slotId": Uuid::nil(), "meetingLink": "https://meet.example/y" }),
        )
        .unwrap();
        assert_eq!(live.mode(), InterviewMode::Live);
        assert_eq!(live.slot_id(), Some(Uuid::nil()));

        let ai: InterviewMetadata =
            serde_json::from_value(json!({ "aiSessionId": "ai_123" })).unwrap();
        assert_eq!(ai.mode(), InterviewMode::Ai);
    }

    #[test]
    fn reschedule_is_blocked_for_terminal_and_running_interviews() {
        assert!(InterviewStatus::Completed.blocks_reschedule());
        assert!(InterviewStatus::Cancelled.blocks_reschedule());
        assert!(InterviewStatus::InProgress.blocks_reschedule());
        assert!(!InterviewStatus::Scheduled.blocks_reschedule());
        assert!(!InterviewStatus::NoShow.blocks_reschedule());
    }
}
