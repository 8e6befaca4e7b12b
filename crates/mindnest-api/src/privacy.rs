use axum::{Extension, Json, extract::State, response::IntoResponse};

use mindnest_db::models::UserRow;
use mindnest_types::api::{Claims, PrivacyResponse, UpdatePrivacyRequest};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::{AppState, with_db};

pub async fn get_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let user = with_db(&state, move |db| db.get_user_by_id(user_id))
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(privacy_response(&user, None)))
}

/// Merges the given flags; `displayName` and `useDisplayNameInChats` are
/// replaced only when present.
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdatePrivacyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let user = with_db(&state, move |db| {
        let Some(user) = db.get_user_by_id(user_id)? else {
            return Ok(None);
        };
        let privacy = req
            .privacy_settings
            .as_ref()
            .map(|patch| patch.apply(user.privacy))
            .unwrap_or(user.privacy);
        let display_name = match req.display_name {
            Some(name) => Some(name.trim().to_string()).filter(|n| !n.is_empty()),
            None => user.display_name.clone(),
        };
        let use_in_chats = req
            .use_display_name_in_chats
            .unwrap_or(user.use_display_name_in_chats);
        db.update_privacy(user_id, &privacy, display_name.as_deref(), use_in_chats)
    })
    .await?
    .ok_or_else(user_not_found)?;

    Ok(Json(privacy_response(
        &user,
        Some("Privacy settings updated successfully"),
    )))
}

fn privacy_response(user: &UserRow, message: Option<&str>) -> PrivacyResponse {
    PrivacyResponse {
        success: true,
        message: message.map(str::to_string),
        privacy_settings: user.privacy,
        display_name: user
            .display_name
            .clone()
            .unwrap_or_else(|| user.name.clone()),
        use_display_name_in_chats: user.use_display_name_in_chats,
    }
}

fn user_not_found() -> ApiError {
    ApiError::not_found("User not found")
}
