mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::Form;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use common::{TestApp, serve_upstream};
use mindnest_api::oauth::GoogleConfig;

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let reply = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "ok");
}

#[tokio::test]
async fn signup_validates_input() {
    let app = TestApp::new();

    let short = app
        .post("/api/auth/signup", None, json!({"name": "Sam", "email": "sam@example.com", "password": "short"}))
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(short.body["success"], false);

    let no_name = app
        .post("/api/auth/signup", None, json!({"name": " ", "email": "sam@example.com", "password": "password123"}))
        .await;
    assert_eq!(no_name.status, StatusCode::BAD_REQUEST);

    let malformed = app
        .send(
            Request::post("/api/auth/signup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.body["success"], false);
}

#[tokio::test]
async fn signup_then_verify_with_mailed_otp() {
    let app = TestApp::new();
    let body = json!({"name": "Sam", "email": "Sam@Example.com", "password": "password123"});

    let reply = app.post("/api/auth/signup", None, body.clone()).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert!(reply.body["userId"].is_string());

    let duplicate = app.post("/api/auth/signup", None, body).await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.body["message"], "Email already registered");

    let otp = app.last_otp();
    assert_eq!(otp.len(), 6);

    let wrong = app
        .post("/api/auth/otp/verify", None, json!({"email": "sam@example.com", "otp": "000000x"}))
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .post("/api/auth/otp/verify", None, json!({"email": "nobody@example.com", "otp": otp}))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let ok = app
        .post("/api/auth/otp/verify", None, json!({"email": "sam@example.com", "otp": otp}))
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["user"]["isVerified"], true);
    assert!(ok.body["token"].is_string());
    assert!(ok.cookie("token").is_some());

    // Codes are single use
    let again = app
        .post("/api/auth/otp/verify", None, json!({"email": "sam@example.com", "otp": otp}))
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["message"], "Invalid or expired OTP");
}

#[tokio::test]
async fn racing_signups_register_once() {
    let app = TestApp::new();
    let body = json!({"name": "Sam", "email": "sam@example.com", "password": "password123"});

    let (a, b) = tokio::join!(
        app.post("/api/auth/signup", None, body.clone()),
        app.post("/api/auth/signup", None, body.clone()),
    );
    let mut statuses = [a.status, b.status];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);
    assert_eq!(app.state.db.count_users(None).unwrap(), 1);
}

#[tokio::test]
async fn resend_otp_replaces_the_code() {
    let app = TestApp::new();
    app.user("Sam", "sam@example.com").await;
    let first = app.last_otp();

    let reply = app.post("/api/auth/otp/send", None, json!({"email": "sam@example.com"})).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(app.state.mailer.sent().len(), 2);

    let second = app.last_otp();
    let ok = app
        .post("/api/auth/otp/verify", None, json!({"email": "sam@example.com", "otp": second}))
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    if first != second {
        let stale = app
            .post("/api/auth/otp/verify", None, json!({"email": "sam@example.com", "otp": first}))
            .await;
        assert_eq!(stale.status, StatusCode::BAD_REQUEST);
    }

    let missing = app.post("/api/auth/otp/send", None, json!({"email": "ghost@example.com"})).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let app = TestApp::new();
    app.user("Sam", "sam@example.com").await;

    for (email, password) in [("sam@example.com", "wrong-password"), ("ghost@example.com", "password123")] {
        let reply = app
            .post("/api/auth/login", None, json!({"email": email, "password": password}))
            .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["message"], "Invalid email or password");
    }
}

#[tokio::test]
async fn session_cookie_authenticates() {
    let app = TestApp::new();
    app.user("Sam", "sam@example.com").await;

    let login = app
        .post("/api/auth/login", None, json!({"email": "sam@example.com", "password": "password123"}))
        .await;
    let cookie = login.cookie("token").unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    let pair = cookie.split(';').next().unwrap().to_string();

    let me = app
        .send(Request::get("/api/auth/me").header(header::COOKIE, pair.clone()).body(Body::empty()).unwrap())
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["message"], "Protected route accessed");
    assert_eq!(me.body["user"]["email"], "sam@example.com");
    assert_eq!(me.body["user"]["role"], "user");

    let logout = app
        .send(Request::post("/api/auth/logout").header(header::COOKIE, pair).body(Body::empty()).unwrap())
        .await;
    assert_eq!(logout.status, StatusCode::OK);
    assert!(logout.cookie("token").unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = TestApp::new();

    let none = app.request(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(none.status, StatusCode::UNAUTHORIZED);

    let forged = app.get("/api/auth/me", "not-a-jwt").await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
    assert_eq!(forged.body["success"], false);
}

#[tokio::test]
async fn unsupported_method_is_405() {
    let app = TestApp::new();
    let reply = app.request(Method::GET, "/api/auth/login", None, None).await;
    assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn reset_token_works_once() {
    let app = TestApp::new();
    app.user("Sam", "sam@example.com").await;

    let missing = app
        .post("/api/auth/forgot-password", None, json!({"email": "ghost@example.com"}))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let reply = app
        .post("/api/auth/forgot-password", None, json!({"email": "sam@example.com"}))
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let body = app.last_mail_body();
    let link = body
        .split_whitespace()
        .find(|w| w.starts_with("http://localhost:3000/resetPassword/"))
        .unwrap();
    let token = link.rsplit('/').next().unwrap();
    assert_eq!(token.len(), 64);

    let reset = app
        .post("/api/auth/reset-password", None, json!({"token": token, "newPassword": "brand-new-pass"}))
        .await;
    assert_eq!(reset.status, StatusCode::OK);

    let reused = app
        .post("/api/auth/reset-password", None, json!({"token": token, "newPassword": "another-pass"}))
        .await;
    assert_eq!(reused.status, StatusCode::BAD_REQUEST);
    assert_eq!(reused.body["message"], "Invalid or expired token");

    app.login("sam@example.com", "brand-new-pass").await;
    let old = app
        .post("/api/auth/login", None, json!({"email": "sam@example.com", "password": "password123"}))
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn change_password_checks_current() {
    let app = TestApp::new();
    let token = app.user("Sam", "sam@example.com").await;

    let wrong = app
        .post(
            "/api/auth/change-password",
            Some(&token),
            json!({"currentPassword": "nope-nope", "newPassword": "updated-pass"}),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let missing = app
        .post("/api/auth/change-password", Some(&token), json!({"newPassword": "updated-pass"}))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let ok = app
        .post(
            "/api/auth/change-password",
            Some(&token),
            json!({"currentPassword": "password123", "newPassword": "updated-pass"}),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    app.login("sam@example.com", "updated-pass").await;
}

#[tokio::test]
async fn google_sign_in_requires_configuration() {
    let app = TestApp::new();
    let reply = app.request(Method::GET, "/api/auth/google", None, None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["message"], "Google sign-in is not configured");
}

#[tokio::test]
async fn google_redirect_sets_state_cookie() {
    let app = TestApp::with(|state| {
        state.google = Some(GoogleConfig::new(
            "client-123".into(),
            "secret".into(),
            "http://localhost:3000/api/auth/google/callback".into(),
        ));
    });

    let reply = app.request(Method::GET, "/api/auth/google", None, None).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    let location = reply.headers[header::LOCATION].to_str().unwrap().to_string();
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(location.contains("client_id=client-123"));

    let state_cookie = reply.cookie("oauth_state").unwrap();
    let state_value = state_cookie.split(';').next().unwrap().trim_start_matches("oauth_state=").to_string();
    assert!(location.contains(&format!("state={state_value}")));

    // A callback whose state does not match the cookie is refused before any
    // call to Google is made
    let forged = app
        .send(
            Request::get("/api/auth/google/callback?code=abc&state=forged")
                .header(header::COOKIE, format!("oauth_state={state_value}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(forged.status, StatusCode::BAD_REQUEST);
    assert_eq!(forged.body["message"], "Invalid OAuth state");
}

/// Fake token and userinfo endpoints. Records every form posted to the token
/// endpoint and only honours the access token it issued.
async fn fake_google(forms: Arc<Mutex<Vec<HashMap<String, String>>>>) -> String {
    let router = Router::new()
        .route(
            "/token",
            post(move |Form(form): Form<HashMap<String, String>>| {
                let forms = forms.clone();
                async move {
                    forms.lock().unwrap().push(form);
                    Json(json!({"access_token": "access-xyz", "token_type": "Bearer"}))
                }
            }),
        )
        .route(
            "/userinfo",
            get(|headers: HeaderMap| async move {
                let auth = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
                if auth != Some("Bearer access-xyz") {
                    return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_token"})));
                }
                (StatusCode::OK, Json(json!({"email": "Jo.Doe@Example.com", "name": "Jo Doe"})))
            }),
        );
    serve_upstream(router).await
}

async fn google_callback(app: &TestApp, code: &str) -> common::Reply {
    let start = app.request(Method::GET, "/api/auth/google", None, None).await;
    let cookie = start.cookie("oauth_state").unwrap();
    let pair = cookie.split(';').next().unwrap().to_string();
    let state = pair.trim_start_matches("oauth_state=").to_string();

    app.send(
        Request::get(format!("/api/auth/google/callback?code={code}&state={state}"))
            .header(header::COOKIE, pair)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn google_callback_creates_account_and_session() {
    let forms = Arc::new(Mutex::new(Vec::new()));
    let upstream = fake_google(forms.clone()).await;
    let app = TestApp::with(|state| {
        let mut google = GoogleConfig::new(
            "client-123".into(),
            "secret-456".into(),
            "http://localhost:3000/api/auth/google/callback".into(),
        );
        google.token_url = format!("{upstream}/token");
        google.userinfo_url = format!("{upstream}/userinfo");
        state.google = Some(google);
    });

    let first = google_callback(&app, "code-1").await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);
    assert_eq!(first.body["user"]["email"], "jo.doe@example.com");
    assert_eq!(first.body["user"]["name"], "Jo Doe");
    assert_eq!(first.body["user"]["provider"], "google");
    assert_eq!(first.body["user"]["isVerified"], true);
    assert!(first.cookie("token").is_some());
    assert!(first.cookie("oauth_state").unwrap().contains("Max-Age=0"));

    let sent = forms.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["code"], "code-1");
    assert_eq!(sent[0]["client_id"], "client-123");
    assert_eq!(sent[0]["client_secret"], "secret-456");
    assert_eq!(sent[0]["grant_type"], "authorization_code");
    assert_eq!(sent[0]["redirect_uri"], "http://localhost:3000/api/auth/google/callback");

    let token = first.body["token"].as_str().unwrap().to_string();
    let me = app.get("/api/auth/me", &token).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["provider"], "google");

    // A second sign-in reuses the account
    let second = google_callback(&app, "code-2").await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["user"]["id"], first.body["user"]["id"]);
    assert_eq!(app.state.db.count_users(None).unwrap(), 1);

    // The account has no password to log in with
    let login = app
        .post("/api/auth/login", None, json!({"email": "jo.doe@example.com", "password": "anything-at-all"}))
        .await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn google_callback_reports_upstream_failure() {
    let upstream = serve_upstream(Router::new().route(
        "/token",
        post(|| async { (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"}))) }),
    ))
    .await;
    let app = TestApp::with(|state| {
        let mut google = GoogleConfig::new("id".into(), "secret".into(), "http://localhost/cb".into());
        google.token_url = format!("{upstream}/token");
        google.userinfo_url = format!("{upstream}/userinfo");
        state.google = Some(google);
    });

    let reply = google_callback(&app, "stale").await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body["message"], "Google sign-in failed");
    assert_eq!(app.state.db.count_users(None).unwrap(), 0);
}
