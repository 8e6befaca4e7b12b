use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use mindnest_db::models::{ContentPatch, ContentRow, NewContent, UserRef};
use mindnest_db::timestamp;
use mindnest_types::api::{
    Claims, ContentResponse, CreateContentRequest, DataResponse, PagedResponse,
    ReviewContentRequest, UpdateContentRequest, UserSummary,
};
use mindnest_types::models::ContentStatus;

use crate::authz::{Access, authorize};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::pagination::Page;
use crate::{AppState, with_db};

#[derive(Debug, Deserialize)]
pub struct ContentListQuery {
    pub status: Option<ContentStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_content(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<ContentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, claims.sub, Access::ModerateContent).await?;

    let page = Page::new(query.page, query.limit);
    let status = query.status;
    let (rows, total) = with_db(&state, move |db| {
        let rows = db.list_content(status, page.offset(), page.limit)?;
        let total = db.count_content(status)?;
        Ok((rows, total))
    })
    .await?;

    Ok(Json(PagedResponse {
        success: true,
        data: rows.into_iter().map(content_response).collect(),
        pagination: page.pagination(total),
    }))
}

pub async fn create_content(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authorize(&state, claims.sub, Access::ModerateContent).await?;

    if req.title.trim().is_empty() || req.description.trim().is_empty() || req.content.trim().is_empty() {
        return Err(ApiError::bad_request("Title, description and content are required"));
    }
    let source = req
        .source
        .ok_or_else(|| ApiError::bad_request("A valid source is required"))?;

    let new = NewContent {
        id: Uuid::new_v4(),
        title: req.title,
        description: req.description,
        body: req.content,
        source,
        source_url: req.source_url,
        author: req.author,
        submitted_by: user.id,
        tags: req.tags,
        created_at: timestamp::now(),
    };
    let id = new.id;
    let row = with_db(&state, move |db| {
        db.insert_content(&new)?;
        db.get_content(new.id)
    })
    .await?
    .ok_or_else(|| anyhow::anyhow!("content {} missing after insert", id))?;
    info!("Content {} submitted by {}", id, user.id);

    Ok((StatusCode::CREATED, Json(DataResponse::ok(content_response(row)))))
}

pub async fn get_content(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, claims.sub, Access::ModerateContent).await?;

    let row = with_db(&state, move |db| db.get_content(id))
        .await?
        .ok_or_else(content_not_found)?;
    Ok(Json(DataResponse::ok(content_response(row))))
}

pub async fn update_content(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let editor = authorize(&state, claims.sub, Access::ModerateContent).await?;

    for (field, value) in [("title", &req.title), ("description", &req.description), ("content", &req.content)] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(ApiError::bad_request(format!("{field} cannot be empty")));
        }
    }

    let patch = ContentPatch {
        title: req.title,
        description: req.description,
        body: req.content,
        source: req.source,
        source_url: req.source_url,
        author: req.author,
        tags: req.tags,
        status: req.status,
        review_notes: req.review_notes,
    };
    let editor_id = editor.id;
    let row = with_db(&state, move |db| {
        db.update_content(id, &patch, editor_id, timestamp::now())
    })
    .await?
    .ok_or_else(content_not_found)?;

    Ok(Json(DataResponse::ok(content_response(row))))
}

pub async fn delete_content(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authorize(&state, claims.sub, Access::DeleteContent).await?;

    let deleted = with_db(&state, move |db| db.delete_content(id)).await?;
    if !deleted {
        return Err(content_not_found());
    }
    info!("Content {} deleted by {}", id, user.id);

    Ok(Json(DataResponse::ok(json!({}))))
}

pub async fn review_content(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<ReviewContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reviewer = authorize(&state, claims.sub, Access::ReviewContent).await?;

    let (Some(id), Some(status)) = (req.content_id, req.status) else {
        return Err(ApiError::bad_request("Content ID and status are required"));
    };
    if !status.is_review_outcome() {
        return Err(ApiError::bad_request("Invalid status"));
    }

    let notes = req.review_notes.unwrap_or_default();
    let reviewer_id = reviewer.id;
    let row = with_db(&state, move |db| {
        db.review_content(id, status, &notes, reviewer_id, timestamp::now())
    })
    .await?
    .ok_or_else(content_not_found)?;
    info!("Content {} reviewed as {} by {}", id, status, reviewer.email);

    Ok(Json(DataResponse::ok(content_response(row))))
}

fn content_not_found() -> ApiError {
    ApiError::not_found("Content not found")
}

fn summary(user: UserRef) -> UserSummary {
    UserSummary {
        id: user.id,
        name: user.name,
        email: user.email,
    }
}

fn content_response(row: ContentRow) -> ContentResponse {
    ContentResponse {
        id: row.id,
        title: row.title,
        description: row.description,
        content: row.body,
        source: row.source,
        source_url: row.source_url,
        author: row.author,
        submitted_by: row.submitted_by.map(summary),
        reviewed_by: row.reviewed_by.map(summary),
        status: row.status,
        review_notes: row.review_notes,
        tags: row.tags,
        created_at: row.created_at,
        updated_at: row.updated_at,
        last_reviewed_at: row.last_reviewed_at,
    }
}
