use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::error::StoreResult;
use crate::db::models::AiSession;
use crate::db::store::AiSessionStore;

pub struct AiSessionRepository {
    pool: PgPool,
}

impl AiSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AiSessionStore for AiSessionRepository {
    async fn create_ai_session(
        &self,
        session_id: &str,
        interview_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<AiSession> {
        let session = sqlx::query_as::<_, AiSession>(
            r#"
            INSERT INTO ai_sessions (id, session_id, interview_id, user_id, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING id, session_id, interview_id, user_id, status, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(session_id)
        .bind(interview_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }
}
