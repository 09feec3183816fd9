use axum::{
    extract::State,
    http::{
        header::{CONTENT_TYPE, HeaderName},
        Method,
    },
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    app_state::AppState,
    middleware::{auth::USER_ID_HEADER, tracing::observability_middleware},
    modules::{
        admin::routes::admin_routes, bookings::routes::booking_routes,
        interviewer::routes::interviewer_routes, notifications::routes::notification_routes,
    },
    websocket::websocket_routes,
};

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .nest("/bookings", booking_routes())
        .nest("/interviewer", interviewer_routes())
        .nest("/admin", admin_routes())
        .nest("/notifications", notification_routes());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .merge(websocket_routes())
        .layer(middleware::from_fn(observability_middleware))
        .layer(cors)
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match &state.db {
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => "healthy",
            Err(e) => {
                tracing::warn!("Database health check failed: {}", e);
                "unhealthy"
            }
        },
        None => "in-memory",
    };

    let timestamp = state
        .clock
        .now()
        .format(&Rfc3339)
        .unwrap_or_default();

    Json(json!({
        "status": "ok",
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
        }
    }))
}
