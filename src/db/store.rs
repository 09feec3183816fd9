use async_trait::async_trait;
use std::sync::Arc;
use time::Date;
use uuid::Uuid;

use super::error::StoreResult;
use super::memory::MemoryStore;
use super::models::{
    AiSession, AvailableSlot, Interview, InterviewFilter, InterviewMode, NewAvailableSlot,
    NewNotification, NewUser, Notification, SlotFilter, User, UserRole,
};
use super::repositories::{
    AiSessionRepository, InterviewRepository, NotificationRepository, SlotRepository,
    UserRepository,
};
use crate::scheduling::time_label::TimeOfDay;

/// Interviewer availability records.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn insert_slot(&self, slot: NewAvailableSlot) -> StoreResult<AvailableSlot>;

    async fn get_slot(&self, slot_id: Uuid) -> StoreResult<Option<AvailableSlot>>;

    /// The interviewer's slot at `(date, time, mode)`, booked or not.
    async fn find_slot_at(
        &self,
        interviewer_id: Uuid,
        date: Date,
        time: TimeOfDay,
        mode: InterviewMode,
    ) -> StoreResult<Option<AvailableSlot>>;

    /// Unbooked slots of `mode` on `date` that have an owning interviewer.
    async fn list_open_slots(&self, date: Date, mode: InterviewMode) -> StoreResult<Vec<AvailableSlot>>;

    async fn list_slots(&self, filter: &SlotFilter) -> StoreResult<Vec<AvailableSlot>>;

    /// Marks the slot booked by `interview_id` if, and only if, it is still
    /// unbooked. `None` means another request got there first.
    async fn claim_slot(&self, slot_id: Uuid, interview_id: Uuid) -> StoreResult<Option<AvailableSlot>>;

    /// Frees the slot if it is still held by `interview_id`.
    async fn release_slot(&self, slot_id: Uuid, interview_id: Uuid) -> StoreResult<Option<AvailableSlot>>;

    /// Deletes the slot unless it is booked. Returns whether a row went away.
    async fn delete_open_slot(&self, slot_id: Uuid) -> StoreResult<bool>;
}

/// Interview bookings.
#[async_trait]
pub trait InterviewStore: Send + Sync {
    async fn insert_interview(&self, interview: &Interview) -> StoreResult<Interview>;

    async fn get_interview(&self, interview_id: Uuid) -> StoreResult<Option<Interview>>;

    async fn update_interview(&self, interview: &Interview) -> StoreResult<Interview>;

    async fn list_interviews(&self, filter: &InterviewFilter) -> StoreResult<Vec<Interview>>;

    /// A non-cancelled booking of the trainee at `(date, time)` in any mode.
    async fn find_active_for_user_at(
        &self,
        user_id: Uuid,
        date: Date,
        time: TimeOfDay,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Interview>>;

    /// A non-cancelled booking of any trainee in `mode` at `(date, time)`.
    async fn find_active_in_mode_at(
        &self,
        mode: InterviewMode,
        date: Date,
        time: TimeOfDay,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Interview>>;

    async fn booked_times_in_mode(&self, mode: InterviewMode, date: Date) -> StoreResult<Vec<TimeOfDay>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;

    async fn list_users_by_role(&self, role: UserRole) -> StoreResult<Vec<User>>;

    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
}

#[async_trait]
pub trait AiSessionStore: Send + Sync {
    async fn create_ai_session(
        &self,
        session_id: &str,
        interview_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<AiSession>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<Notification>;

    async fn list_notifications(&self, user_id: Uuid, unread_only: bool) -> StoreResult<Vec<Notification>>;

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Notification>>;
}

/// Every store the handlers need, behind trait objects so the same code runs
/// against PostgreSQL or the in-memory backend.
#[derive(Clone)]
pub struct Repositories {
    pub slots: Arc<dyn SlotStore>,
    pub interviews: Arc<dyn InterviewStore>,
    pub users: Arc<dyn UserStore>,
    pub ai_sessions: Arc<dyn AiSessionStore>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Repositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            slots: Arc::new(SlotRepository::new(pool.clone())),
            interviews: Arc::new(InterviewRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            ai_sessions: Arc::new(AiSessionRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool)),
        }
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            slots: store.clone(),
            interviews: store.clone(),
            users: store.clone(),
            ai_sessions: store.clone(),
            notifications: store,
        }
    }
}
