use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{ApiResponse, AppPath, AppQuery};
use crate::app_state::AppState;
use crate::db::Notification;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub unread_only: Option<bool>,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    AppQuery(query): AppQuery<NotificationQuery>,
) -> AppResult<ApiResponse<Vec<Notification>>> {
    let rows = state
        .repos
        .notifications
        .list_notifications(auth.id(), query.unread_only.unwrap_or(false))
        .await?;
    Ok(ApiResponse::ok(rows))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<ApiResponse<Notification>> {
    let notification = state
        .repos
        .notifications
        .mark_notification_read(id, auth.id())
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
    Ok(ApiResponse::ok(notification))
}
