#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use time::macros::datetime;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use mockrise_backend::{
    app::create_router,
    app_state::AppState,
    config::Config,
    db::{MemoryStore, NewUser, Repositories, User, UserRole, UserStatus, UserStore},
    scheduling::clock::FixedClock,
};

/// Wednesday 2025-01-15, 14:45 UTC.
pub const NOW: OffsetDateTime = datetime!(2025-01-15 14:45 UTC);
pub const TODAY: &str = "2025-01-15";
pub const TOMORROW: &str = "2025-01-16";
pub const YESTERDAY: &str = "2025-01-14";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub trainee: User,
    pub other_trainee: User,
    pub interviewer: User,
    pub admin: User,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(NOW));
        let state = AppState::new(
            None,
            Repositories::from_memory(store.clone()),
            Config::for_tests(),
            clock.clone(),
        )
        .expect("test state");

        let trainee = seed_user(&store, "Tara Trainee", UserRole::Trainee, UserStatus::Approved).await;
        let other_trainee = seed_user(&store, "Omar Other", UserRole::Trainee, UserStatus::Approved).await;
        let interviewer = seed_user(&store, "Iris Interviewer", UserRole::Interviewer, UserStatus::Approved).await;
        let admin = seed_user(&store, "Ada Admin", UserRole::Admin, UserStatus::Approved).await;

        Self {
            router: create_router(state),
            store,
            clock,
            trainee,
            other_trainee,
            interviewer,
            admin,
        }
    }

    pub async fn add_user(&self, name: &str, role: UserRole, status: UserStatus) -> User {
        seed_user(&self.store, name, role, status).await
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<&User>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user.id.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, user: &User) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: &User, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &User, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &User) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(user), None).await
    }

    /// Publishes a live slot as `interviewer` and returns its id.
    pub async fn add_slot(&self, interviewer: &User, date: &str, time: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/api/interviewer/availability/add",
                interviewer,
                json!({ "date": date, "time": time, "mode": "live" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add slot failed: {body}");
        id_of(&body)
    }

    pub async fn book_live(&self, trainee: &User, slot_id: Uuid, date: &str, time: &str) -> (StatusCode, Value) {
        self.post(
            "/api/bookings/create",
            trainee,
            json!({
                "mode": "live",
                "scheduledDate": date,
                "timeSlot": time,
                "duration": 60,
                "language": "English",
                "slotId": slot_id,
                "interviewerId": self.interviewer.id,
            }),
        )
        .await
    }

    pub async fn book_self_serve(&self, trainee: &User, mode: &str, date: &str, time: &str) -> (StatusCode, Value) {
        self.post(
            "/api/bookings/create",
            trainee,
            json!({
                "mode": mode,
                "scheduledDate": date,
                "timeSlot": time,
                "duration": 30,
                "language": "English",
                "difficulty": "medium",
                "consentFlags": { "recording": true },
            }),
        )
        .await
    }
}

async fn seed_user(store: &MemoryStore, name: &str, role: UserRole, status: UserStatus) -> User {
    let email = format!("{}@mockrise.test", name.to_lowercase().replace(' ', "."));
    store
        .insert_user(NewUser {
            name: name.to_string(),
            email,
            role,
            status,
        })
        .await
        .expect("seed user")
}

pub fn id_of(body: &Value) -> Uuid {
    body["data"]["id"]
        .as_str()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .unwrap_or_else(|| panic!("no id in {body}"))
}
