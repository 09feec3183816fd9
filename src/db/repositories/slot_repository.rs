use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::Date;
use uuid::Uuid;

use crate::db::error::StoreResult;
use crate::db::models::{AvailableSlot, InterviewMode, NewAvailableSlot, SlotFilter};
use crate::db::store::SlotStore;
use crate::scheduling::time_label::TimeOfDay;

const SLOT_COLUMNS: &str = "id, interviewer_id, slot_date, slot_time, mode, is_booked, \
                            interview_id, version, created_at, updated_at";

pub struct SlotRepository {
    pool: PgPool,
}

impl SlotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotStore for SlotRepository {
    async fn insert_slot(&self, slot: NewAvailableSlot) -> StoreResult<AvailableSlot> {
        let sql = format!(
            "INSERT INTO available_slots (id, interviewer_id, slot_date, slot_time, mode) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SLOT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AvailableSlot>(&sql)
            .bind(Uuid::now_v7())
            .bind(slot.interviewer_id)
            .bind(slot.date)
            .bind(slot.time)
            .bind(slot.mode)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_slot(&self, slot_id: Uuid) -> StoreResult<Option<AvailableSlot>> {
        let sql = format!("SELECT {SLOT_COLUMNS} FROM available_slots WHERE id = $1");
        let row = sqlx::query_as::<_, AvailableSlot>(&sql)
            .bind(slot_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_slot_at(
        &self,
        interviewer_id: Uuid,
        date: Date,
        time: TimeOfDay,
        mode: InterviewMode,
    ) -> StoreResult<Option<AvailableSlot>> {
        let sql = format!(
            "SELECT {SLOT_COLUMNS} FROM available_slots \
             WHERE interviewer_id = $1 AND slot_date = $2 AND slot_time = $3 AND mode = $4"
        );
        let row = sqlx::query_as::<_, AvailableSlot>(&sql)
            .bind(interviewer_id)
            .bind(date)
            .bind(time)
            .bind(mode)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_open_slots(&self, date: Date, mode: InterviewMode) -> StoreResult<Vec<AvailableSlot>> {
        let sql = format!(
            "SELECT {SLOT_COLUMNS} FROM available_slots \
             WHERE slot_date = $1 AND mode = $2 AND is_booked = FALSE \
               AND interviewer_id IS NOT NULL \
             ORDER BY slot_time, created_at"
        );
        let rows = sqlx::query_as::<_, AvailableSlot>(&sql)
            .bind(date)
            .bind(mode)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_slots(&self, filter: &SlotFilter) -> StoreResult<Vec<AvailableSlot>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {SLOT_COLUMNS} FROM available_slots WHERE TRUE"
        ));
        if let Some(interviewer_id) = filter.interviewer_id {
            query.push(" AND interviewer_id = ").push_bind(interviewer_id);
        }
        if let Some(date) = filter.date {
            query.push(" AND slot_date = ").push_bind(date);
        }
        if let Some(mode) = filter.mode {
            query.push(" AND mode = ").push_bind(mode);
        }
        if !filter.include_booked {
            query.push(" AND is_booked = FALSE");
        }
        query.push(" ORDER BY slot_date, slot_time");

        let rows = query
            .build_query_as::<AvailableSlot>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn claim_slot(&self, slot_id: Uuid, interview_id: Uuid) -> StoreResult<Option<AvailableSlot>> {
        let sql = format!(
            "UPDATE available_slots \
             SET is_booked = TRUE, interview_id = $2, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND is_booked = FALSE \
             RETURNING {SLOT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AvailableSlot>(&sql)
            .bind(slot_id)
            .bind(interview_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn release_slot(&self, slot_id: Uuid, interview_id: Uuid) -> StoreResult<Option<AvailableSlot>> {
        let sql = format!(
            "UPDATE available_slots \
             SET is_booked = FALSE, interview_id = NULL, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND interview_id = $2 \
             RETURNING {SLOT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AvailableSlot>(&sql)
            .bind(slot_id)
            .bind(interview_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_open_slot(&self, slot_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM available_slots WHERE id = $1 AND is_booked = FALSE")
            .bind(slot_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
