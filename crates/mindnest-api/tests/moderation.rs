mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

fn article(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "description": "Short summary",
        "content": "Breathing exercises for stressful days.",
        "source": "Manual Submission",
        "tags": ["stress", "breathing"]
    })
}

#[tokio::test]
async fn regular_users_cannot_moderate() {
    let app = TestApp::new();
    let token = app.user("Sam", "sam@example.com").await;

    let list = app.get("/api/content", &token).await;
    assert_eq!(list.status, StatusCode::FORBIDDEN);
    assert_eq!(list.body["success"], false);

    let create = app.post("/api/content", Some(&token), article("Nope")).await;
    assert_eq!(create.status, StatusCode::FORBIDDEN);

    let users = app.get("/api/admin/users", &token).await;
    assert_eq!(users.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn content_lifecycle() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;

    let missing_source = app
        .post("/api/content", Some(&admin), json!({"title": "t", "description": "d", "content": "c"}))
        .await;
    assert_eq!(missing_source.status, StatusCode::BAD_REQUEST);

    let created = app.post("/api/content", Some(&admin), article("Breathe")).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let item = &created.body["data"];
    assert_eq!(item["status"], "Pending");
    assert_eq!(item["submittedBy"]["email"], "admin@example.com");
    assert!(item["reviewedBy"].is_null());
    let id = item["id"].as_str().unwrap().to_string();

    let bad_review = app
        .request(
            Method::POST,
            "/api/content/review",
            Some(&admin),
            Some(json!({"contentId": id, "status": "Pending"})),
        )
        .await;
    assert_eq!(bad_review.status, StatusCode::BAD_REQUEST);

    let reviewed = app
        .request(
            Method::POST,
            "/api/content/review",
            Some(&admin),
            Some(json!({"contentId": id, "status": "Approved", "reviewNotes": "Looks good"})),
        )
        .await;
    assert_eq!(reviewed.status, StatusCode::OK);
    let item = &reviewed.body["data"];
    assert_eq!(item["status"], "Approved");
    assert_eq!(item["reviewNotes"], "Looks good");
    assert_eq!(item["reviewedBy"]["email"], "admin@example.com");
    assert!(item["lastReviewedAt"].is_string());

    let approved = app.get("/api/content?status=Approved", &admin).await;
    assert_eq!(approved.body["data"].as_array().unwrap().len(), 1);
    let rejected = app.get("/api/content?status=Rejected", &admin).await;
    assert!(rejected.body["data"].as_array().unwrap().is_empty());

    let edited = app
        .request(
            Method::PUT,
            &format!("/api/content/{id}"),
            Some(&admin),
            Some(json!({"title": "Breathe deeper"})),
        )
        .await;
    assert_eq!(edited.status, StatusCode::OK);
    assert_eq!(edited.body["data"]["title"], "Breathe deeper");
    assert_eq!(edited.body["data"]["description"], "Short summary");

    let deleted = app
        .request(Method::DELETE, &format!("/api/content/{id}"), Some(&admin), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body, json!({"success": true, "data": {}}));

    let gone = app.get(&format!("/api/content/{id}"), &admin).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.body["message"], "Content not found");
}

#[tokio::test]
async fn malformed_content_id_is_rejected() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    let reply = app.get("/api/content/not-a-uuid", &admin).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn validators_need_explicit_permissions() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    let validator = app.user("Val", "val@example.com").await;

    let users = app.get("/api/admin/users?role=user", &admin).await;
    assert_eq!(users.status, StatusCode::OK);
    let listed = users.body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["email"], "val@example.com");
    assert!(listed[0].get("passwordHash").is_none());
    let val_id = listed[0]["id"].as_str().unwrap().to_string();

    let bad_role = app.get("/api/admin/users?role=overlord", &admin).await;
    assert_eq!(bad_role.status, StatusCode::BAD_REQUEST);

    let promoted = app
        .request(
            Method::PUT,
            "/api/admin/users",
            Some(&admin),
            Some(json!({"userId": val_id, "role": "content_validator", "permissions": {"canEditContent": true}})),
        )
        .await;
    assert_eq!(promoted.status, StatusCode::OK);
    assert_eq!(promoted.body["data"]["role"], "content_validator");
    assert_eq!(promoted.body["data"]["permissions"]["canEditContent"], true);
    assert_eq!(promoted.body["data"]["permissions"]["canApproveContent"], false);

    // Access is checked against the stored role, so the old token now works
    let list = app.get("/api/content", &validator).await;
    assert_eq!(list.status, StatusCode::OK);

    let created = app.post("/api/content", Some(&validator), article("Sleep")).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["data"]["id"].as_str().unwrap().to_string();

    let review = app
        .request(
            Method::POST,
            "/api/content/review",
            Some(&validator),
            Some(json!({"contentId": id, "status": "Rejected"})),
        )
        .await;
    assert_eq!(review.status, StatusCode::FORBIDDEN);
    assert_eq!(review.body["message"], "Not authorized to review content");

    let delete = app
        .request(Method::DELETE, &format!("/api/content/{id}"), Some(&validator), None)
        .await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);

    let manage = app.get("/api/admin/users", &validator).await;
    assert_eq!(manage.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn content_listing_is_paginated() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    for i in 0..12 {
        let reply = app.post("/api/content", Some(&admin), article(&format!("Item {i}"))).await;
        assert_eq!(reply.status, StatusCode::CREATED);
    }

    let first = app.get("/api/content?limit=5", &admin).await;
    assert_eq!(first.body["data"].as_array().unwrap().len(), 5);
    assert_eq!(first.body["pagination"], json!({"total": 12, "page": 1, "pages": 3}));

    let last = app.get("/api/content?page=3&limit=5", &admin).await;
    assert_eq!(last.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(last.body["pagination"]["page"], 3);
}

#[tokio::test]
async fn pages_far_past_the_end_are_empty() {
    let app = TestApp::new();
    let admin = app.admin("admin@example.com").await;
    app.post("/api/content", Some(&admin), article("Only one")).await;

    let reply = app.get("/api/content?page=100000000000000000&limit=100", &admin).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body["data"].as_array().unwrap().is_empty());
    assert_eq!(reply.body["pagination"]["total"], 1);

    let users = app
        .get(&format!("/api/admin/users?page={}&limit=1", i64::MAX), &admin)
        .await;
    assert_eq!(users.status, StatusCode::OK);
    assert!(users.body["data"].as_array().unwrap().is_empty());
}
