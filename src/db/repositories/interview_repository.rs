use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::Date;
use uuid::Uuid;

use crate::db::error::StoreResult;
use crate::db::models::{Interview, InterviewFilter, InterviewMode};
use crate::db::store::InterviewStore;
use crate::scheduling::time_label::TimeOfDay;

const INTERVIEW_COLUMNS: &str = "id, user_id, interviewer_id, mode, scheduled_date, time_slot, \
                                 duration, language, difficulty, focus_area, status, consent, \
                                 metadata, notes, cancellation_reason, cancelled_at, cancelled_by, \
                                 started_at, completed_at, created_at, updated_at";

pub struct InterviewRepository {
    pool: PgPool,
}

impl InterviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterviewStore for InterviewRepository {
    async fn insert_interview(&self, interview: &Interview) -> StoreResult<Interview> {
        let sql = format!(
            "INSERT INTO interviews (id, user_id, interviewer_id, mode, scheduled_date, time_slot, \
                                     duration, language, difficulty, focus_area, status, consent, \
                                     metadata, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15) \
             RETURNING {INTERVIEW_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Interview>(&sql)
            .bind(interview.id)
            .bind(interview.user_id)
            .bind(interview.interviewer_id)
            .bind(interview.mode)
            .bind(interview.scheduled_date)
            .bind(interview.time_slot)
            .bind(interview.duration)
            .bind(&interview.language)
            .bind(&interview.difficulty)
            .bind(&interview.focus_area)
            .bind(interview.status)
            .bind(Json(&interview.consent))
            .bind(Json(&interview.metadata))
            .bind(&interview.notes)
            .bind(interview.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_interview(&self, interview_id: Uuid) -> StoreResult<Option<Interview>> {
        let sql = format!("SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE id = $1");
        let row = sqlx::query_as::<_, Interview>(&sql)
            .bind(interview_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_interview(&self, interview: &Interview) -> StoreResult<Interview> {
        let sql = format!(
            "UPDATE interviews SET \
                interviewer_id = $2, scheduled_date = $3, time_slot = $4, duration = $5, \
                language = $6, difficulty = $7, focus_area = $8, status = $9, metadata = $10, \
                notes = $11, cancellation_reason = $12, cancelled_at = $13, cancelled_by = $14, \
                started_at = $15, completed_at = $16, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {INTERVIEW_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Interview>(&sql)
            .bind(interview.id)
            .bind(interview.interviewer_id)
            .bind(interview.scheduled_date)
            .bind(interview.time_slot)
            .bind(interview.duration)
            .bind(&interview.language)
            .bind(&interview.difficulty)
            .bind(&interview.focus_area)
            .bind(interview.status)
            .bind(Json(&interview.metadata))
            .bind(&interview.notes)
            .bind(&interview.cancellation_reason)
            .bind(interview.cancelled_at)
            .bind(interview.cancelled_by)
            .bind(interview.started_at)
            .bind(interview.completed_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_interviews(&self, filter: &InterviewFilter) -> StoreResult<Vec<Interview>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE TRUE"
        ));
        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(interviewer_id) = filter.interviewer_id {
            query.push(" AND interviewer_id = ").push_bind(interviewer_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(mode) = filter.mode {
            query.push(" AND mode = ").push_bind(mode);
        }
        if let Some(from) = filter.from {
            query.push(" AND scheduled_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND scheduled_date <= ").push_bind(to);
        }
        query.push(" ORDER BY scheduled_date DESC, time_slot DESC");

        let rows = query
            .build_query_as::<Interview>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_active_for_user_at(
        &self,
        user_id: Uuid,
        date: Date,
        time: TimeOfDay,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Interview>> {
        let sql = format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews \
             WHERE user_id = $1 AND scheduled_date = $2 AND time_slot = $3 \
               AND status <> 'cancelled' AND ($4::uuid IS NULL OR id <> $4) \
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, Interview>(&sql)
            .bind(user_id)
            .bind(date)
            .bind(time)
            .bind(exclude)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_active_in_mode_at(
        &self,
        mode: InterviewMode,
        date: Date,
        time: TimeOfDay,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Interview>> {
        let sql = format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews \
             WHERE mode = $1 AND scheduled_date = $2 AND time_slot = $3 \
               AND status <> 'cancelled' AND ($4::uuid IS NULL OR id <> $4) \
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, Interview>(&sql)
            .bind(mode)
            .bind(date)
            .bind(time)
            .bind(exclude)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn booked_times_in_mode(&self, mode: InterviewMode, date: Date) -> StoreResult<Vec<TimeOfDay>> {
        let times = sqlx::query_scalar::<_, TimeOfDay>(
            "SELECT time_slot FROM interviews \
             WHERE mode = $1 AND scheduled_date = $2 AND status <> 'cancelled'",
        )
        .bind(mode)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(times)
    }
}
