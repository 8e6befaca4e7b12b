use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use mindnest_db::models::MessageRow;
use mindnest_db::timestamp;
use mindnest_types::api::{ChatMessageResponse, Claims, SendChatMessageRequest};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::{AppState, with_db};

/// Shown instead of the sender name on the caller's own messages.
const SELF_SENDER: &str = "You";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    pub group_id: Option<Uuid>,
    /// Polling cursor: the `createdAt` of the newest message the client has.
    pub last_timestamp: Option<String>,
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SendChatMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    let Some(group_id) = req.group_id.filter(|_| !content.is_empty()) else {
        return Err(ApiError::bad_request("Group ID and message content are required"));
    };

    let user_id = claims.sub;
    let message = with_db(&state, move |db| {
        if db.get_group(group_id)?.is_none() {
            return Ok(Err(ApiError::not_found("Group not found")));
        }
        let Some(sender) = db.get_user_by_id(user_id)? else {
            return Ok(Err(ApiError::unauthorized("Not authenticated")));
        };

        let message = MessageRow {
            id: Uuid::new_v4(),
            group_id,
            sender: sender.chat_name().to_string(),
            sender_email: sender.email.clone(),
            content,
            created_at: timestamp::now(),
        };
        db.insert_message(&message)?;
        Ok(Ok(message))
    })
    .await??;

    Ok((StatusCode::CREATED, Json(message_response(message, None))))
}

/// Messages newer than the cursor, oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<MessageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let group_id = query
        .group_id
        .ok_or_else(|| ApiError::bad_request("Group ID is required"))?;
    let after = parse_cursor(query.last_timestamp.as_deref())?;

    let rows = with_db(&state, move |db| db.get_messages(group_id, after)).await?;
    let me = claims.email.to_lowercase();
    let messages: Vec<_> = rows
        .into_iter()
        .map(|row| message_response(row, Some(&me)))
        .collect();

    Ok(Json(messages))
}

fn parse_cursor(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => timestamp::decode(s)
            .map(Some)
            .map_err(|_| ApiError::bad_request("Invalid lastTimestamp")),
    }
}

fn message_response(row: MessageRow, viewer: Option<&str>) -> ChatMessageResponse {
    let own = viewer.is_some_and(|me| row.sender_email.eq_ignore_ascii_case(me));
    ChatMessageResponse {
        id: row.id,
        group_id: row.group_id,
        sender: if own { SELF_SENDER.to_string() } else { row.sender },
        sender_email: row.sender_email,
        content: row.content,
        created_at: row.created_at,
    }
}
