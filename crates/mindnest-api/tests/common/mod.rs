#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use mindnest_api::mail::Mailer;
use mindnest_api::{AppState, AppStateInner, router};
use mindnest_db::Database;

/// Serves `router` on an ephemeral loopback port and returns its base URL.
/// Stands in for third-party HTTP APIs.
pub async fn serve_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    /// The `name=value` pair of a Set-Cookie header for `name`.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{name}=")))
            .map(str::to_string)
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(|_| {})
    }

    pub fn with(configure: impl FnOnce(&mut AppStateInner)) -> Self {
        let mut inner = AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
            production: false,
            base_url: "http://localhost:3000".into(),
            mailer: Mailer::memory(),
            http: reqwest::Client::new(),
            google: None,
            ai: None,
        };
        configure(&mut inner);
        let state = Arc::new(inner);
        let router = router(state.clone());
        Self { state, router }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    pub async fn send(&self, req: Request<Body>) -> Reply {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Reply { status, headers, body }
    }

    pub async fn get(&self, uri: &str, token: &str) -> Reply {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Reply {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Last mail in the memory outbox.
    pub fn last_mail_body(&self) -> String {
        self.state.mailer.sent().last().map(|m| m.body.clone()).unwrap_or_default()
    }

    pub fn last_otp(&self) -> String {
        self.last_mail_body()
            .split_whitespace()
            .find(|w| w.trim_end_matches('.').len() == 6 && w.trim_end_matches('.').bytes().all(|b| b.is_ascii_digit()))
            .map(|w| w.trim_end_matches('.').to_string())
            .unwrap_or_default()
    }

    /// Signs up, logs in and returns the session token.
    pub async fn user(&self, name: &str, email: &str) -> String {
        let reply = self
            .post(
                "/api/auth/signup",
                None,
                json!({"name": name, "email": email, "password": "password123"}),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
        self.login(email, "password123").await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let reply = self
            .post("/api/auth/login", None, json!({"email": email, "password": password}))
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{:?}", reply.body);
        reply.body["token"].as_str().unwrap().to_string()
    }

    /// A signed-in admin holding every permission.
    pub async fn admin(&self, email: &str) -> String {
        let token = self.user("Admin", email).await;
        assert!(self.state.db.promote_to_admin(email).unwrap());
        token
    }
}
