use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::error::StoreResult;
use crate::db::models::{NewUser, User, UserRole};
use crate::db::store::UserStore;

/// Read access to the accounts owned by the auth service, plus inserts for
/// seeding.
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, status, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users_by_role(&self, role: UserRole) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, status, created_at
            FROM users
            WHERE role = $1
            ORDER BY created_at
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, role, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, role, status, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&user.name)
        .bind(user.email.to_lowercase())
        .bind(user.role)
        .bind(user.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }
}
