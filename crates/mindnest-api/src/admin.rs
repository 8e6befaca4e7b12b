use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::info;

use mindnest_db::models::UserRow;
use mindnest_types::api::{Claims, DataResponse, PagedResponse, UpdateUserRequest, UserResponse};
use mindnest_types::models::Role;

use crate::authz::{Access, authorize};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::pagination::Page;
use crate::{AppState, with_db};

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, claims.sub, Access::ManageUsers).await?;

    let role = match query.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => Some(
            raw.parse::<Role>()
                .map_err(|_| ApiError::bad_request(format!("Invalid role '{raw}'")))?,
        ),
        None => None,
    };
    let page = Page::new(query.page, query.limit);

    let (rows, total) = with_db(&state, move |db| {
        let rows = db.list_users(role, page.offset(), page.limit)?;
        let total = db.count_users(role)?;
        Ok((rows, total))
    })
    .await?;

    Ok(Json(PagedResponse {
        success: true,
        data: rows.iter().map(user_response).collect(),
        pagination: page.pagination(total),
    }))
}

/// Replaces the role and merges the given permission flags.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = authorize(&state, claims.sub, Access::ManageUsers).await?;

    let user_id = req
        .user_id
        .ok_or_else(|| ApiError::bad_request("User ID is required"))?;

    let updated = with_db(&state, move |db| {
        let Some(user) = db.get_user_by_id(user_id)? else {
            return Ok(None);
        };
        let role = req.role.unwrap_or(user.role);
        let permissions = req
            .permissions
            .as_ref()
            .map(|patch| patch.apply(user.permissions))
            .unwrap_or(user.permissions);
        db.update_role_and_permissions(user_id, role, permissions)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;
    info!("User {} updated by admin {} (role {})", updated.id, admin.id, updated.role);

    Ok(Json(DataResponse::ok(user_response(&updated))))
}

/// Client view of an account, without credentials or one-time codes.
pub(crate) fn user_response(user: &UserRow) -> UserResponse {
    UserResponse {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
        permissions: user.permissions,
        privacy_settings: user.privacy,
        display_name: user.display_name.clone(),
        use_display_name_in_chats: user.use_display_name_in_chats,
        is_verified: user.is_verified,
        provider: user.provider,
        created_at: user.created_at,
    }
}
