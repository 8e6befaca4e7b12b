pub mod admin;
pub mod ai;
pub mod auth;
pub mod authz;
pub mod content;
pub mod error;
pub mod extract;
pub mod groups;
pub mod journal;
pub mod mail;
pub mod messages;
pub mod middleware;
pub mod oauth;
pub mod pagination;
pub mod privacy;
pub mod resources;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tracing::error;

use mindnest_db::Database;

use crate::ai::AiConfig;
use crate::error::ApiError;
use crate::mail::Mailer;
use crate::oauth::GoogleConfig;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Production mode: cookies are marked `Secure`.
    pub production: bool,
    /// Public origin used in links sent by e-mail.
    pub base_url: String,
    pub mailer: Mailer,
    pub http: reqwest::Client,
    pub google: Option<GoogleConfig>,
    pub ai: Option<AiConfig>,
}

/// Runs a blocking database call off the async runtime.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal("Internal server error", e)
        })?
        .map_err(ApiError::from)
}

/// Every HTTP route of the service. Routes under the auth layer need a
/// session token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/otp/send", post(auth::send_otp))
        .route("/api/auth/otp/verify", post(auth::verify_otp))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password))
        .route("/api/auth/google", get(oauth::start))
        .route("/api/auth/google/callback", get(oauth::callback))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/change-password", post(auth::change_password))
        .route("/api/content", get(content::list_content).post(content::create_content))
        .route("/api/content/review", post(content::review_content))
        .route(
            "/api/content/{id}",
            get(content::get_content)
                .put(content::update_content)
                .delete(content::delete_content),
        )
        .route(
            "/api/groups",
            get(groups::list_groups).post(groups::create_group).patch(groups::add_member),
        )
        .route("/api/groups/leave", post(groups::leave_group))
        .route("/api/messages", get(messages::get_messages).post(messages::send_message))
        .route("/api/journal", post(journal::create_entry))
        .route("/api/journal/history", get(journal::history))
        .route("/api/journal/analytics", get(journal::analytics))
        .route("/api/journal/profile", get(journal::profile))
        .route("/api/admin/users", get(admin::list_users).put(admin::update_user))
        .route(
            "/api/privacy-settings",
            get(privacy::get_settings).put(privacy::update_settings),
        )
        .route(
            "/api/resources/history",
            get(resources::list_history)
                .post(resources::save_search)
                .delete(resources::delete_history),
        )
        .route("/api/ai-conversation", post(ai::converse))
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

async fn health() -> &'static str {
    "ok"
}
