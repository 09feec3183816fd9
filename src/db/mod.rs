mod error;
pub mod memory;
pub mod models;
mod repositories;
pub mod store;

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

pub use error::{DatabaseError, StoreResult};
pub use memory::MemoryStore;
pub use models::*;
pub use repositories::*;
pub use store::{
    AiSessionStore, InterviewStore, NotificationStore, Repositories, SlotStore, UserStore,
};

/// Initialize the database connection pool and apply pending migrations.
pub async fn init_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections.unwrap_or(10))
        .min_connections(config.min_connections.unwrap_or(1))
        .connect(&config.url)
        .await
        .context("Failed to connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}
