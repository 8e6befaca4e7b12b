use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use uuid::Uuid;

use mindnest_db::models::SearchRow;
use mindnest_db::timestamp;
use mindnest_types::api::{Claims, SaveSearchRequest, SearchHistoryEntry, SuccessResponse};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::{AppState, with_db};

/// Searches kept per user; older ones are pruned on insert.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct DeleteHistoryQuery {
    pub id: Option<Uuid>,
}

pub async fn list_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let rows = with_db(&state, move |db| db.list_searches(user_id, HISTORY_LIMIT)).await?;
    Ok(Json(rows.into_iter().map(search_entry).collect::<Vec<_>>()))
}

pub async fn save_search(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SaveSearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = req
        .query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query is required"))?;

    let row = SearchRow {
        id: Uuid::new_v4(),
        user_id: claims.sub,
        query,
        search_type: req.search_type.unwrap_or_default(),
        timestamp: timestamp::now(),
    };
    let row = with_db(&state, move |db| {
        db.insert_search(&row, HISTORY_LIMIT)?;
        Ok(row)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(search_entry(row))))
}

/// Deletes one entry when `id` is given, otherwise the whole history.
pub async fn delete_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<DeleteHistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    with_db(&state, move |db| match query.id {
        Some(id) => db.delete_search(user_id, id).map(|_| ()),
        None => db.clear_searches(user_id).map(|_| ()),
    })
    .await?;

    Ok(Json(SuccessResponse { success: true }))
}

fn search_entry(row: SearchRow) -> SearchHistoryEntry {
    SearchHistoryEntry {
        id: row.id,
        query: row.query,
        search_type: row.search_type,
        timestamp: row.timestamp,
    }
}
