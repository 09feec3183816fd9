use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config;
use crate::db::{Notification, Repositories};
use crate::scheduling::clock::Clock;
use crate::scheduling::window::BookingWindow;

const NOTIFICATION_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    /// Only present when running against PostgreSQL; used by `/health`.
    pub db: Option<PgPool>,
    pub repos: Repositories,
    pub env: config::Config,
    pub window: BookingWindow,
    pub clock: Arc<dyn Clock>,
    pub ws_tx: broadcast::Sender<Notification>,
}

impl AppState {
    pub fn new(
        db: Option<PgPool>,
        repos: Repositories,
        env: config::Config,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let window = env.booking.window()?;
        let (ws_tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Ok(Self {
            db,
            repos,
            env,
            window,
            clock,
            ws_tx,
        })
    }
}
