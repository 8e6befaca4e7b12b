use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;
use jsonwebtoken::{EncodingKey, Header, encode};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use mindnest_db::models::{NewUser, UserRow};
use mindnest_db::timestamp;
use mindnest_types::api::{
    ChangePasswordRequest, Claims, CurrentUserResponse, EmailRequest, LoginRequest,
    ResetPasswordRequest, SessionResponse, SessionUser, SignupRequest, SignupResponse,
    StatusMessage, VerifyOtpRequest,
};
use mindnest_types::models::AuthProvider;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::mail;
use crate::middleware::SESSION_COOKIE;
use crate::{AppState, with_db};

const MIN_PASSWORD_LEN: usize = 8;
const OTP_TTL_MINUTES: i64 = 15;
const RESET_TTL_MINUTES: i64 = 15;
const SESSION_TTL_DAYS: i64 = 7;

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim().to_string();
    let email = normalize_email(&req.email);
    if name.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("Name and a valid email are required"));
    }
    check_password_strength(&req.password)?;

    let password_hash = hash_password(&req.password)?;
    let otp = generate_otp();
    let now = timestamp::now();
    let user = NewUser {
        id: Uuid::new_v4(),
        name,
        email: email.clone(),
        password_hash: Some(password_hash),
        otp: Some(otp.clone()),
        otp_expires_at: Some(now + Duration::minutes(OTP_TTL_MINUTES)),
        is_verified: false,
        provider: AuthProvider::Credentials,
        created_at: now,
    };

    let user_id = user.id;
    let created = with_db(&state, move |db| db.register_user(&user)).await?;
    if !created {
        return Err(ApiError::bad_request("Email already registered"));
    }
    info!("User {} signed up", user_id);

    state
        .mailer
        .send(mail::otp_mail(&email, &otp))
        .await
        .map_err(|e| ApiError::internal("Failed to send OTP", e))?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered. Check your email for the verification code.".into(),
            user_id,
        }),
    ))
}

pub async fn send_otp(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<EmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email);
    if email.is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }

    let otp = generate_otp();
    let expires_at = timestamp::now() + Duration::minutes(OTP_TTL_MINUTES);
    let code = otp.clone();
    let lookup = email.clone();
    let found = with_db(&state, move |db| {
        let Some(user) = db.get_user_by_email(&lookup)? else {
            return Ok(false);
        };
        db.set_otp(user.id, &code, expires_at)?;
        Ok(true)
    })
    .await?;
    if !found {
        return Err(ApiError::not_found("User not found"));
    }

    state
        .mailer
        .send(mail::otp_mail(&email, &otp))
        .await
        .map_err(|e| ApiError::internal("Failed to send OTP", e))?;

    Ok(Json(StatusMessage::new("OTP sent to your email")))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<VerifyOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email);
    let otp = req.otp.trim().to_string();
    if email.is_empty() || otp.is_empty() {
        return Err(ApiError::bad_request("Email and OTP are required"));
    }

    let verified = with_db(&state, move |db| {
        if db.get_user_by_email(&email)?.is_none() {
            return Ok(None);
        }
        Ok(Some(db.consume_otp(&email, &otp, timestamp::now())?))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?
    .ok_or_else(|| ApiError::bad_request("Invalid or expired OTP"))?;

    info!("User {} verified their email", verified.id);
    start_session(&state, jar, &verified, "Email verified successfully")
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email);
    let user = with_db(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(invalid_credentials)?;

    // Google accounts have no password to check against
    let hash = user.password_hash.as_deref().ok_or_else(invalid_credentials)?;
    if !verify_password(&req.password, hash) {
        return Err(invalid_credentials());
    }

    start_session(&state, jar, &user, "Login successful")
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(StatusMessage::new("Logged out successfully")),
    )
}

pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<EmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email);
    if email.is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }

    let token = generate_reset_token();
    let digest = token_digest(&token);
    let expires_at = timestamp::now() + Duration::minutes(RESET_TTL_MINUTES);
    let lookup = email.clone();
    let found = with_db(&state, move |db| {
        let Some(user) = db.get_user_by_email(&lookup)? else {
            return Ok(false);
        };
        db.set_reset_token(user.id, &digest, expires_at)?;
        Ok(true)
    })
    .await?;
    if !found {
        return Err(ApiError::not_found("User not found"));
    }

    let link = format!("{}/resetPassword/{}", state.base_url.trim_end_matches('/'), token);
    state
        .mailer
        .send(mail::reset_mail(&email, &link))
        .await
        .map_err(|e| ApiError::internal("Failed to send reset email", e))?;

    Ok(Json(StatusMessage::new("Password reset link sent to your email")))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = req.token.trim();
    if token.is_empty() || req.new_password.is_empty() {
        return Err(ApiError::bad_request("Token and new password are required"));
    }
    check_password_strength(&req.new_password)?;

    let digest = token_digest(token);
    let password_hash = hash_password(&req.new_password)?;
    let reset = with_db(&state, move |db| {
        db.consume_reset_token(&digest, &password_hash, timestamp::now())
    })
    .await?;
    if !reset {
        return Err(ApiError::bad_request("Invalid or expired token"));
    }

    Ok(Json(StatusMessage::new("Password has been reset successfully")))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err(ApiError::bad_request("Current and new password are required"));
    }
    check_password_strength(&req.new_password)?;

    let user_id = claims.sub;
    let user = with_db(&state, move |db| db.get_user_by_id(user_id))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let hash = user.password_hash.as_deref().ok_or_else(|| {
        ApiError::bad_request("Accounts that sign in with Google have no password to change")
    })?;
    if !verify_password(&req.current_password, hash) {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let new_hash = hash_password(&req.new_password)?;
    with_db(&state, move |db| db.update_password(user_id, &new_hash)).await?;
    info!("User {} changed their password", user_id);

    Ok(Json(StatusMessage::new("Password updated successfully")))
}

pub async fn me(Extension(claims): Extension<Claims>) -> impl IntoResponse {
    Json(CurrentUserResponse {
        message: "Protected route accessed".into(),
        user: claims,
    })
}

/// Issues a session token for `user`, as JSON and as the session cookie.
pub(crate) fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: &UserRow,
    message: &str,
) -> Result<(CookieJar, Json<SessionResponse>), ApiError> {
    let token = create_token(&state.jwt_secret, user)?;
    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.production)
        .path("/");

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            message: message.to_string(),
            token,
            user: session_user(user),
        }),
    ))
}

pub fn create_token(secret: &str, user: &UserRow) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        provider: user.provider,
        exp: (chrono::Utc::now() + Duration::days(SESSION_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn session_user(user: &UserRow) -> SessionUser {
    SessionUser {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        provider: user.provider,
        is_verified: user.is_verified,
    }
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid email or password")
}

fn check_password_strength(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Argon2id with a fresh random salt.
fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal("Internal server error", anyhow::anyhow!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

fn generate_otp() -> String {
    rand::rng().random_range(100_000..1_000_000u32).to_string()
}

fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Only the digest of a reset token is stored.
fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
