use std::collections::BTreeSet;
use tracing::{debug, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{Interview, NewNotification, NotificationType, UserRole};

/// Best-effort notification fan-out. Failures are logged and never reach
/// the caller of the booking operation.
pub struct Notice {
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NotificationType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Every admin plus the assigned interviewer, if any.
pub async fn admins_and_interviewer(state: &AppState, interview: &Interview) -> Vec<Uuid> {
    let mut recipients = match state.repos.users.list_users_by_role(UserRole::Admin).await {
        Ok(admins) => admins.into_iter().map(|admin| admin.id).collect(),
        Err(err) => {
            warn!(error = %err, "could not load admins for notification");
            Vec::new()
        }
    };
    recipients.extend(interview.interviewer_id);
    recipients
}

/// The trainee plus the assigned interviewer, if any.
pub fn participants(interview: &Interview) -> Vec<Uuid> {
    let mut recipients = vec![interview.user_id];
    recipients.extend(interview.interviewer_id);
    recipients
}

/// Stores one notification per distinct recipient, skipping the actor, and
/// pushes each stored row to connected websocket clients.
pub async fn dispatch(
    state: &AppState,
    recipients: Vec<Uuid>,
    actor: Uuid,
    interview: &Interview,
    notice: Notice,
) {
    let unique: BTreeSet<Uuid> = recipients.into_iter().filter(|id| *id != actor).collect();

    for user_id in unique {
        let new = NewNotification {
            user_id,
            notification_type: notice.kind,
            title: notice.title.clone(),
            message: notice.message.clone(),
            reference_id: Some(interview.id),
        };
        if let Err(err) = new.validate() {
            warn!(error = %err, "skipping malformed notification");
            continue;
        }

        match state.repos.notifications.insert_notification(new).await {
            Ok(stored) => {
                // No subscribers is the normal case outside of live sessions.
                if state.ws_tx.send(stored).is_err() {
                    debug!(%user_id, "no websocket subscribers for notification");
                }
            }
            Err(err) => {
                warn!(%user_id, interview_id = %interview.id, error = %err, "failed to store notification");
            }
        }
    }
}

/// Human readable "on <date> at <time>" fragment.
pub fn when(interview: &Interview) -> String {
    format!(
        "{} at {}",
        crate::scheduling::calendar::format_calendar_date(interview.scheduled_date),
        interview.time_slot
    )
}
