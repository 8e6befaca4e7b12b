use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use uuid::Uuid;

use mindnest_db::models::JournalEntryRow;
use mindnest_db::timestamp;
use mindnest_insights::analytics::{self, Timeframe};
use mindnest_insights::{EntrySample, profile, sentiment};
use mindnest_types::api::{
    Claims, CreateJournalEntryRequest, JournalEntryResponse, JournalSavedResponse,
};
use mindnest_types::models::Mood;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::{AppState, with_db};

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub timeframe: Option<String>,
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateJournalEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = req.text.trim().to_string();
    if req.mood.trim().is_empty() || text.is_empty() {
        return Err(ApiError::bad_request("Mood and text are required"));
    }
    let mood: Mood = req
        .mood
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid mood"))?;

    let entry = JournalEntryRow {
        id: Uuid::new_v4(),
        user_id: claims.sub,
        mood: mood.to_string(),
        text,
        created_at: timestamp::now(),
    };
    let entry = with_db(&state, move |db| {
        db.insert_journal_entry(&entry)?;
        Ok(entry)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(JournalSavedResponse {
            message: "Journal entry saved".into(),
            entry: entry_response(entry, false),
        }),
    ))
}

/// Every entry of the caller, newest first, scored at read time.
pub async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let rows = with_db(&state, move |db| db.journal_entries_for_user(user_id)).await?;
    let entries: Vec<_> = rows.into_iter().map(|row| entry_response(row, true)).collect();
    Ok(Json(entries))
}

pub async fn analytics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let timeframe = Timeframe::parse(query.timeframe.as_deref());
    let end = timestamp::now();
    let start = timeframe.start(end);

    let user_id = claims.sub;
    let rows = with_db(&state, move |db| db.journal_entries_between(user_id, start, end)).await?;
    let samples: Vec<_> = rows.iter().map(sample).collect();

    Ok(Json(analytics::summarize(&samples, timeframe, start, end)))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let rows = with_db(&state, move |db| db.journal_entries_for_user(user_id)).await?;
    let samples: Vec<_> = rows.iter().map(sample).collect();

    Ok(Json(profile::generate(&claims.name, &samples)))
}

fn sample(row: &JournalEntryRow) -> EntrySample<'_> {
    EntrySample {
        mood: &row.mood,
        text: &row.text,
        created_at: row.created_at,
    }
}

fn entry_response(row: JournalEntryRow, scored: bool) -> JournalEntryResponse {
    JournalEntryResponse {
        sentiment: scored.then(|| sentiment::score(&row.text)),
        id: row.id,
        mood: row.mood,
        text: row.text,
        created_at: row.created_at,
    }
}
