use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSession {
    pub id: Uuid,
    pub session_id: String,
    pub interview_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub fn new_ai_session_id() -> String {
    format!("ai_{}", Uuid::new_v4().simple())
}
