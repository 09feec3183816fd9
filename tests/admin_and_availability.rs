mod common;

use axum::http::{Method, StatusCode};
use common::{id_of, TestApp, TOMORROW, YESTERDAY};
use mockrise_backend::db::{SlotStore, UserRole, UserStatus};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn interviewers_manage_their_own_availability() {
    let app = TestApp::new().await;
    let slot_id = app.add_slot(&app.interviewer, TOMORROW, "09:00 AM").await;
    app.add_slot(&app.interviewer, TOMORROW, "10:00 AM").await;

    let (status, body) = app
        .post(
            "/api/interviewer/availability/add",
            &app.interviewer,
            json!({ "date": TOMORROW, "time": "9:00 am" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You already have availability at this time");

    let (status, _) = app
        .post(
            "/api/interviewer/availability/add",
            &app.interviewer,
            json!({ "date": YESTERDAY, "time": "09:00 AM" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/interviewer/availability/add",
            &app.trainee,
            json!({ "date": TOMORROW, "time": "09:00 AM" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let pending = app
        .add_user("Penny Pending", UserRole::Interviewer, UserStatus::Pending)
        .await;
    let (status, _) = app
        .post(
            "/api/interviewer/availability/add",
            &pending,
            json!({ "date": TOMORROW, "time": "09:00 AM" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.book_live(&app.trainee, slot_id, TOMORROW, "09:00 AM").await;

    let (_, body) = app.get("/api/interviewer/availability", &app.interviewer).await;
    let open = body["data"].as_array().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0]["time"], "10:00 AM");
    assert_eq!(open[0]["isBooked"], false);

    let (_, body) = app
        .get(
            &format!("/api/interviewer/availability?date={TOMORROW}&includeBooked=true"),
            &app.interviewer,
        )
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn availability_delete_rules() {
    let app = TestApp::new().await;
    let booked = app.add_slot(&app.interviewer, TOMORROW, "09:00 AM").await;
    let open = app.add_slot(&app.interviewer, TOMORROW, "10:00 AM").await;
    app.book_live(&app.trainee, booked, TOMORROW, "09:00 AM").await;

    let other = app
        .add_user("Olga Interviewer", UserRole::Interviewer, UserStatus::Approved)
        .await;

    let uri = |id: Uuid| format!("/api/interviewer/availability/delete/{id}");

    let (status, _) = app.delete(&uri(Uuid::new_v4()), &app.interviewer).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&uri(open), &other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.delete(&uri(booked), &app.interviewer).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot delete a booked slot");

    let (status, body) = app.delete(&uri(open), &app.interviewer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], open.to_string());
    assert!(app.store.get_slot(open).await.unwrap().is_none());
    assert!(app.store.get_slot(booked).await.unwrap().is_some());
}

#[tokio::test]
async fn admins_see_every_interviewers_slots() {
    let app = TestApp::new().await;
    let other = app
        .add_user("Olga Interviewer", UserRole::Interviewer, UserStatus::Approved)
        .await;
    app.add_slot(&app.interviewer, TOMORROW, "09:00 AM").await;
    app.add_slot(&other, TOMORROW, "09:00 AM").await;

    let (_, body) = app.get("/api/interviewer/availability", &app.admin).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app
        .get(
            &format!("/api/interviewer/availability?interviewerId={}", other.id),
            &app.admin,
        )
        .await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["interviewerId"], other.id.to_string());

    // Both interviewers offer 09:00 AM; trainees see two candidates.
    let (_, body) = app
        .get(&format!("/api/bookings/slots?date={TOMORROW}&mode=live"), &app.trainee)
        .await;
    assert_eq!(body["data"]["slots"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn admin_interview_endpoints_are_admin_only() {
    let app = TestApp::new().await;
    for (method, uri) in [
        (Method::GET, "/api/admin/interviews".to_string()),
        (Method::GET, format!("/api/admin/interviews/{}", Uuid::new_v4())),
    ] {
        let (status, _) = app.request(method, &uri, Some(&app.trainee), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
    let (status, _) = app
        .request(Method::GET, "/api/admin/interviews", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_listing_filters() {
    let app = TestApp::new().await;
    app.book_self_serve(&app.trainee, "ai", TOMORROW, "09:00 AM").await;
    app.book_self_serve(&app.other_trainee, "peer", TOMORROW, "10:00 AM").await;
    app.book_self_serve(&app.trainee, "peer", "2025-01-20", "10:00 AM").await;

    let (_, body) = app.get("/api/admin/interviews", &app.admin).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, body) = app.get("/api/admin/interviews?mode=peer", &app.admin).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app
        .get(&format!("/api/admin/interviews?userId={}", app.trainee.id), &app.admin)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app
        .get("/api/admin/interviews?from=2025-01-17&to=2025-01-31", &app.admin)
        .await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["scheduledDate"], "2025-01-20");

    let (status, _) = app.get("/api/admin/interviews?from=nope", &app.admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_update_edits_details_and_routes_cancellation() {
    let app = TestApp::new().await;
    let slot_id = app.add_slot(&app.interviewer, TOMORROW, "09:00 AM").await;
    let (_, body) = app.book_live(&app.trainee, slot_id, TOMORROW, "09:00 AM").await;
    let interview_id = id_of(&body);
    let uri = format!("/api/admin/interviews/{interview_id}");

    let (status, body) = app
        .put(&uri, &app.admin, json!({ "duration": 45, "notes": "system design focus" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["duration"], 45);
    assert_eq!(body["data"]["notes"], "system design focus");

    let (status, _) = app.put(&uri, &app.admin, json!({ "duration": 50 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .put(
            &uri,
            &app.admin,
            json!({ "status": "cancelled", "cancellationReason": "interviewer sick" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(body["data"]["cancelledBy"], app.admin.id.to_string());
    assert!(!app.store.get_slot(slot_id).await.unwrap().unwrap().is_booked);

    let (status, body) = app.put(&uri, &app.admin, json!({ "status": "scheduled" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cancelled interviews cannot be reopened");

    let (_, body) = app.get("/api/notifications", &app.trainee).await;
    let kinds: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["notificationType"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["interview_cancelled"]);
}

#[tokio::test]
async fn admin_reschedule_and_cancel_paths() {
    let app = TestApp::new().await;
    let old_slot = app.add_slot(&app.interviewer, TOMORROW, "09:00 AM").await;
    let new_slot = app.add_slot(&app.interviewer, TOMORROW, "05:00 PM").await;
    let (_, body) = app.book_live(&app.trainee, old_slot, TOMORROW, "09:00 AM").await;
    let interview_id = id_of(&body);

    let (status, body) = app
        .put(
            &format!("/api/admin/interviews/{interview_id}"),
            &app.admin,
            json!({ "slotId": new_slot, "language": "German" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["timeSlot"], "05:00 PM");
    assert_eq!(body["data"]["language"], "German");
    assert!(!app.store.get_slot(old_slot).await.unwrap().unwrap().is_booked);

    let (status, _) = app
        .put(
            &format!("/api/admin/interviews/{interview_id}"),
            &app.admin,
            json!({ "status": "cancelled", "timeSlot": "09:00 AM" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let cancel_uri = format!("/api/admin/interviews/{interview_id}/cancel");
    let (status, body) = app
        .post(&cancel_uri, &app.admin, json!({ "reason": "no longer needed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cancellationReason"], "no longer needed");
    assert!(!app.store.get_slot(new_slot).await.unwrap().unwrap().is_booked);

    let (status, _) = app.post(&cancel_uri, &app.admin, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            &format!("/api/admin/interviews/{}/cancel", Uuid::new_v4()),
            &app.admin,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_the_in_memory_store() {
    let app = TestApp::new().await;
    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["services"]["database"], "in-memory");

    let (status, _) = app.request(Method::GET, "/api/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
