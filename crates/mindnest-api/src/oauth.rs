//! Google sign-in (OAuth 2.0 authorization code flow).

use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use mindnest_db::models::NewUser;
use mindnest_db::timestamp;
use mindnest_types::api::GoogleCallbackQuery;
use mindnest_types::models::AuthProvider;

use crate::auth::{normalize_email, start_session};
use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::{AppState, with_db};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Cookie holding the anti-forgery `state` between redirect and callback.
pub const STATE_COOKIE: &str = "oauth_state";

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    /// Code-for-token exchange endpoint.
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleConfig {
    /// Configuration against Google's public endpoints.
    pub fn new(client_id: String, client_secret: String, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleProfile {
    email: String,
    #[serde(default)]
    name: Option<String>,
}

/// Redirects the browser to Google's consent page.
pub async fn start(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let google = state.google.as_ref().ok_or_else(not_configured)?;

    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    let csrf = hex::encode(bytes);

    let url = reqwest::Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("client_id", google.client_id.as_str()),
            ("redirect_uri", google.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("state", csrf.as_str()),
        ],
    )
    .map_err(|e| ApiError::internal("Internal server error", e))?;

    // Lax: the callback arrives as a cross-site top-level navigation
    let cookie = Cookie::build((STATE_COOKIE, csrf))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.production)
        .path("/");

    Ok((jar.add(cookie), Redirect::to(url.as_str())))
}

pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiQuery(query): ApiQuery<GoogleCallbackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let google = state.google.as_ref().ok_or_else(not_configured)?;

    if let Some(error) = query.error {
        warn!("Google sign-in returned an error: {}", error);
        return Err(ApiError::bad_request("Google sign-in was cancelled"));
    }

    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    match (&query.state, &expected) {
        (Some(got), Some(want)) if got == want => {}
        _ => return Err(ApiError::bad_request("Invalid OAuth state")),
    }
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing authorization code"))?;

    let profile = fetch_profile(&state.http, google, &code)
        .await
        .map_err(|e| ApiError::internal("Google sign-in failed", e))?;

    let email = normalize_email(&profile.email);
    let name = profile
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    let new_user = NewUser {
        id: Uuid::new_v4(),
        name,
        email,
        password_hash: None,
        otp: None,
        otp_expires_at: None,
        is_verified: true,
        provider: AuthProvider::Google,
        created_at: timestamp::now(),
    };
    let user = with_db(&state, move |db| db.find_or_create_user(&new_user)).await?;
    info!("User {} signed in with Google", user.id);

    let jar = jar.remove(Cookie::build(STATE_COOKIE).path("/"));
    start_session(&state, jar, &user, "Signed in with Google")
}

async fn fetch_profile(
    http: &reqwest::Client,
    google: &GoogleConfig,
    code: &str,
) -> anyhow::Result<GoogleProfile> {
    let token: TokenResponse = http
        .post(&google.token_url)
        .form(&[
            ("code", code),
            ("client_id", google.client_id.as_str()),
            ("client_secret", google.client_secret.as_str()),
            ("redirect_uri", google.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let profile = http
        .get(&google.userinfo_url)
        .bearer_auth(&token.access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(profile)
}

fn not_configured() -> ApiError {
    ApiError::not_found("Google sign-in is not configured")
}
