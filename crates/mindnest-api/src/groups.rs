use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

use mindnest_db::models::GroupRow;
use mindnest_db::timestamp;
use mindnest_types::api::{
    AddMemberRequest, Claims, CreateGroupRequest, GroupActionResponse, GroupResponse,
    LeaveGroupRequest,
};

use crate::auth::normalize_email;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::{AppState, with_db};

pub async fn list_groups(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let groups = with_db(&state, |db| db.list_groups()).await?;
    Ok(Json(groups.into_iter().map(group_response).collect::<Vec<_>>()))
}

pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("Group name is required"));
    }

    // The creator administers the group and is always its first member
    let admin = normalize_email(&claims.email);
    let mut members = vec![admin.clone()];
    members.extend(
        req.members
            .iter()
            .map(|m| normalize_email(m))
            .filter(|m| !m.is_empty()),
    );

    let id = Uuid::new_v4();
    let group = with_db(&state, move |db| {
        db.create_group(id, &name, &admin, &members, timestamp::now())
    })
    .await?;
    info!("Group {} created by {}", group.id, claims.sub);

    Ok((StatusCode::CREATED, Json(group_response(group))))
}

pub async fn add_member(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    ApiJson(req): ApiJson<AddMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let member = req.member_email.as_deref().map(normalize_email).unwrap_or_default();
    let Some(group_id) = req.group_id.filter(|_| !member.is_empty()) else {
        return Err(ApiError::bad_request("Group ID and member email are required"));
    };

    let group = change_membership(&state, group_id, member, Membership::Join).await?;
    Ok(Json(GroupActionResponse {
        success: true,
        message: "Member added successfully".into(),
        group: group_response(group),
    }))
}

pub async fn leave_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<LeaveGroupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let group_id = req
        .group_id
        .ok_or_else(|| ApiError::bad_request("Group ID is required"))?;
    let member = req
        .member_id
        .as_deref()
        .map(normalize_email)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| normalize_email(&claims.email));

    let group = change_membership(&state, group_id, member, Membership::Leave).await?;
    Ok(Json(GroupActionResponse {
        success: true,
        message: "Left group successfully".into(),
        group: group_response(group),
    }))
}

#[derive(Debug, Clone, Copy)]
enum Membership {
    Join,
    Leave,
}

async fn change_membership(
    state: &AppState,
    group_id: Uuid,
    member: String,
    change: Membership,
) -> Result<GroupRow, ApiError> {
    let outcome = with_db(state, move |db| {
        if db.get_group(group_id)?.is_none() {
            return Ok(None);
        }
        let now = timestamp::now();
        let changed = match change {
            Membership::Join => db.add_group_member(group_id, &member, now)?,
            Membership::Leave => db.remove_group_member(group_id, &member, now)?,
        };
        Ok(Some((changed, db.get_group(group_id)?)))
    })
    .await?;

    match outcome {
        None | Some((_, None)) => Err(ApiError::not_found("Group not found")),
        Some((false, _)) => Err(ApiError::bad_request(match change {
            Membership::Join => "Member already exists in the group",
            Membership::Leave => "Member is not in this group",
        })),
        Some((true, Some(group))) => Ok(group),
    }
}

pub(crate) fn group_response(group: GroupRow) -> GroupResponse {
    GroupResponse {
        id: group.id,
        name: group.name,
        admin: group.admin,
        members: group.members,
        created_at: group.created_at,
        updated_at: group.updated_at,
    }
}
