use async_trait::async_trait;
use std::collections::HashMap;
use time::{Date, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{DatabaseError, StoreResult};
use super::models::{
    AiSession, AvailableSlot, Interview, InterviewFilter, InterviewMode, NewAvailableSlot,
    NewNotification, NewUser, Notification, SlotFilter, User, UserRole,
};
use super::store::{AiSessionStore, InterviewStore, NotificationStore, SlotStore, UserStore};
use crate::scheduling::time_label::TimeOfDay;

/// Process-local backend with the same conditional-write and uniqueness
/// rules as the PostgreSQL schema. Used by tests and local experiments.
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<Uuid, AvailableSlot>>,
    interviews: RwLock<HashMap<Uuid, Interview>>,
    users: RwLock<HashMap<Uuid, User>>,
    ai_sessions: RwLock<HashMap<Uuid, AiSession>>,
    notifications: RwLock<HashMap<Uuid, Notification>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ai_session_for(&self, interview_id: Uuid) -> Option<AiSession> {
        self.ai_sessions
            .read()
            .await
            .values()
            .find(|s| s.interview_id == interview_id)
            .cloned()
    }
}

/// Mirrors the partial unique indexes on `interviews`.
fn check_interview_uniqueness(
    interviews: &HashMap<Uuid, Interview>,
    candidate: &Interview,
) -> StoreResult<()> {
    if !candidate.status.is_active() {
        return Ok(());
    }
    for other in interviews.values() {
        if other.id == candidate.id || !other.status.is_active() {
            continue;
        }
        let same_time = other.scheduled_date == candidate.scheduled_date
            && other.time_slot == candidate.time_slot;
        if same_time && other.user_id == candidate.user_id {
            return Err(DatabaseError::Duplicate(
                "uq_interviews_trainee_time".to_string(),
            ));
        }
        if same_time && candidate.mode != InterviewMode::Live && other.mode == candidate.mode {
            return Err(DatabaseError::Duplicate(
                "uq_interviews_mode_timeline".to_string(),
            ));
        }
    }
    Ok(())
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn insert_slot(&self, slot: NewAvailableSlot) -> StoreResult<AvailableSlot> {
        let mut slots = self.slots.write().await;
        let duplicate = slots.values().any(|s| {
            s.interviewer_id == Some(slot.interviewer_id)
                && s.date == slot.date
                && s.time == slot.time
                && s.mode == slot.mode
        });
        if duplicate {
            return Err(DatabaseError::Duplicate(
                "uq_available_slots_interviewer_time".to_string(),
            ));
        }
        let now = OffsetDateTime::now_utc();
        let created = AvailableSlot {
            id: Uuid::now_v7(),
            interviewer_id: Some(slot.interviewer_id),
            date: slot.date,
            time: slot.time,
            mode: slot.mode,
            is_booked: false,
            interview_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        slots.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_slot(&self, slot_id: Uuid) -> StoreResult<Option<AvailableSlot>> {
        Ok(self.slots.read().await.get(&slot_id).cloned())
    }

    async fn find_slot_at(
        &self,
        interviewer_id: Uuid,
        date: Date,
        time: TimeOfDay,
        mode: InterviewMode,
    ) -> StoreResult<Option<AvailableSlot>> {
        Ok(self
            .slots
            .read()
            .await
            .values()
            .find(|s| {
                s.interviewer_id == Some(interviewer_id)
                    && s.date == date
                    && s.time == time
                    && s.mode == mode
            })
            .cloned())
    }

    async fn list_open_slots(&self, date: Date, mode: InterviewMode) -> StoreResult<Vec<AvailableSlot>> {
        let mut open: Vec<AvailableSlot> = self
            .slots
            .read()
            .await
            .values()
            .filter(|s| s.date == date && s.mode == mode && !s.is_booked && s.interviewer_id.is_some())
            .cloned()
            .collect();
        open.sort_by_key(|s| (s.time, s.created_at));
        Ok(open)
    }

    async fn list_slots(&self, filter: &SlotFilter) -> StoreResult<Vec<AvailableSlot>> {
        let mut slots: Vec<AvailableSlot> = self
            .slots
            .read()
            .await
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.date, s.time));
        Ok(slots)
    }

    async fn claim_slot(&self, slot_id: Uuid, interview_id: Uuid) -> StoreResult<Option<AvailableSlot>> {
        let mut slots = self.slots.write().await;
        match slots.get_mut(&slot_id) {
            Some(slot) if !slot.is_booked => {
                slot.is_booked = true;
                slot.interview_id = Some(interview_id);
                slot.version += 1;
                slot.updated_at = OffsetDateTime::now_utc();
                Ok(Some(slot.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release_slot(&self, slot_id: Uuid, interview_id: Uuid) -> StoreResult<Option<AvailableSlot>> {
        let mut slots = self.slots.write().await;
        match slots.get_mut(&slot_id) {
            Some(slot) if slot.interview_id == Some(interview_id) => {
                slot.is_booked = false;
                slot.interview_id = None;
                slot.version += 1;
                slot.updated_at = OffsetDateTime::now_utc();
                Ok(Some(slot.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_open_slot(&self, slot_id: Uuid) -> StoreResult<bool> {
        let mut slots = self.slots.write().await;
        match slots.get(&slot_id) {
            Some(slot) if !slot.is_booked => {
                slots.remove(&slot_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn insert_interview(&self, interview: &Interview) -> StoreResult<Interview> {
        let mut interviews = self.interviews.write().await;
        if interviews.contains_key(&interview.id) {
            return Err(DatabaseError::Duplicate("interviews_pkey".to_string()));
        }
        check_interview_uniqueness(&interviews, interview)?;
        let mut created = interview.clone();
        created.updated_at = created.created_at;
        interviews.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_interview(&self, interview_id: Uuid) -> StoreResult<Option<Interview>> {
        Ok(self.interviews.read().await.get(&interview_id).cloned())
    }

    async fn update_interview(&self, interview: &Interview) -> StoreResult<Interview> {
        let mut interviews = self.interviews.write().await;
        if !interviews.contains_key(&interview.id) {
            return Err(DatabaseError::NotFound);
        }
        check_interview_uniqueness(&interviews, interview)?;
        let mut updated = interview.clone();
        updated.updated_at = OffsetDateTime::now_utc();
        interviews.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn list_interviews(&self, filter: &InterviewFilter) -> StoreResult<Vec<Interview>> {
        let mut interviews: Vec<Interview> = self
            .interviews
            .read()
            .await
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        interviews.sort_by(|a, b| {
            (b.scheduled_date, b.time_slot).cmp(&(a.scheduled_date, a.time_slot))
        });
        Ok(interviews)
    }

    async fn find_active_for_user_at(
        &self,
        user_id: Uuid,
        date: Date,
        time: TimeOfDay,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Interview>> {
        Ok(self
            .interviews
            .read()
            .await
            .values()
            .find(|i| {
                i.user_id == user_id
                    && i.scheduled_date == date
                    && i.time_slot == time
                    && i.status.is_active()
                    && Some(i.id) != exclude
            })
            .cloned())
    }

    async fn find_active_in_mode_at(
        &self,
        mode: InterviewMode,
        date: Date,
        time: TimeOfDay,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Interview>> {
        Ok(self
            .interviews
            .read()
            .await
            .values()
            .find(|i| {
                i.mode == mode
                    && i.scheduled_date == date
                    && i.time_slot == time
                    && i.status.is_active()
                    && Some(i.id) != exclude
            })
            .cloned())
    }

    async fn booked_times_in_mode(&self, mode: InterviewMode, date: Date) -> StoreResult<Vec<TimeOfDay>> {
        Ok(self
            .interviews
            .read()
            .await
            .values()
            .filter(|i| i.mode == mode && i.scheduled_date == date && i.status.is_active())
            .map(|i| i.time_slot)
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn list_users_by_role(&self, role: UserRole) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let email = user.email.to_lowercase();
        if users.values().any(|u| u.email == email) {
            return Err(DatabaseError::Duplicate("users_email_key".to_string()));
        }
        let created = User {
            id: Uuid::now_v7(),
            name: user.name,
            email,
            role: user.role,
            status: user.status,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl AiSessionStore for MemoryStore {
    async fn create_ai_session(
        &self,
        session_id: &str,
        interview_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<AiSession> {
        let session = AiSession {
            id: Uuid::now_v7(),
            session_id: session_id.to_string(),
            interview_id,
            user_id,
            status: "pending".to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.ai_sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(session)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<Notification> {
        let created = Notification {
            id: Uuid::now_v7(),
            user_id: notification.user_id,
            notification_type: notification.notification_type,
            title: notification.title,
            message: notification.message,
            is_read: false,
            reference_id: notification.reference_id,
            created_at: OffsetDateTime::now_utc(),
            read_at: None,
        };
        self.notifications
            .write()
            .await
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_notifications(&self, user_id: Uuid, unread_only: bool) -> StoreResult<Vec<Notification>> {
        let mut rows: Vec<Notification> = self
            .notifications
            .read()
            .await
            .values()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Notification>> {
        let mut notifications = self.notifications.write().await;
        match notifications.get_mut(&notification_id) {
            Some(n) if n.user_id == user_id => {
                n.is_read = true;
                n.read_at.get_or_insert_with(OffsetDateTime::now_utc);
                Ok(Some(n.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use time::macros::date;

    fn new_slot(interviewer_id: Uuid) -> NewAvailableSlot {
        NewAvailableSlot {
            interviewer_id,
            date: date!(2030 - 05 - 01),
            time: TimeOfDay::from_hm(9, 0).unwrap(),
            mode: InterviewMode::Live,
        }
    }

    #[tokio::test]
    async fn claim_is_conditional_on_the_slot_being_free() {
        let store = MemoryStore::new();
        let slot = store.insert_slot(new_slot(Uuid::new_v4())).await.unwrap();
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());

        let claimed = store.claim_slot(slot.id, first).await.unwrap().unwrap();
        assert!(claimed.is_booked);
        assert_eq!(claimed.interview_id, Some(first));
        assert_eq!(claimed.version, 1);

        assert!(store.claim_slot(slot.id, second).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_claims_have_exactly_one_winner() {
        let store = Arc::new(MemoryStore::new());
        let slot = store.insert_slot(new_slot(Uuid::new_v4())).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.claim_slot(slot.id, Uuid::new_v4()).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn release_only_applies_to_the_holding_interview() {
        let store = MemoryStore::new();
        let slot = store.insert_slot(new_slot(Uuid::new_v4())).await.unwrap();
        let holder = Uuid::new_v4();
        store.claim_slot(slot.id, holder).await.unwrap();

        assert!(store.release_slot(slot.id, Uuid::new_v4()).await.unwrap().is_none());
        let released = store.release_slot(slot.id, holder).await.unwrap().unwrap();
        assert!(!released.is_booked);
        assert_eq!(released.interview_id, None);
        assert!(store.release_slot(slot.id, holder).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn booked_slots_cannot_be_deleted() {
        let store = MemoryStore::new();
        let slot = store.insert_slot(new_slot(Uuid::new_v4())).await.unwrap();
        store.claim_slot(slot.id, Uuid::new_v4()).await.unwrap();
        assert!(!store.delete_open_slot(slot.id).await.unwrap());
        assert!(store.get_slot(slot.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_slot_for_same_interviewer_is_rejected() {
        let store = MemoryStore::new();
        let interviewer = Uuid::new_v4();
        store.insert_slot(new_slot(interviewer)).await.unwrap();
        let err = store.insert_slot(new_slot(interviewer)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate(_)));
        store.insert_slot(new_slot(Uuid::new_v4())).await.unwrap();
    }
}
