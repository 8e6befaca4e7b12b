use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use mindnest_types::models::ContentStatus;

use super::{
    OptionalExt, conversion_error, enum_col, opt_ts_col, opt_uuid_col, sql_int, ts_col, uuid_col,
};
use crate::Database;
use crate::models::{ContentPatch, ContentRow, NewContent, UserRef};
use crate::timestamp;

// Submitter and reviewer are joined in so one query returns populated refs.
const CONTENT_SELECT: &str = "SELECT c.id, c.title, c.description, c.body, c.source, c.source_url,
        c.author, c.status, c.review_notes, c.tags, c.created_at, c.updated_at, c.last_reviewed_at,
        s.id, s.name, s.email, r.id, r.name, r.email
    FROM content c
    LEFT JOIN users s ON c.submitted_by = s.id
    LEFT JOIN users r ON c.reviewed_by = r.id";

impl Database {
    pub fn insert_content(&self, content: &NewContent) -> Result<()> {
        let tags = serde_json::to_string(&content.tags)?;
        let created = timestamp::encode(&content.created_at);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO content (id, title, description, body, source, source_url, author,
                    submitted_by, status, tags, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'Pending', ?9, ?10, ?10)",
                params![
                    content.id.to_string(),
                    content.title,
                    content.description,
                    content.body,
                    content.source.as_str(),
                    content.source_url,
                    content.author,
                    content.submitted_by.to_string(),
                    tags,
                    created,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_content(&self, id: Uuid) -> Result<Option<ContentRow>> {
        self.with_conn(|conn| query_content(conn, id))
    }

    /// Newest first, optionally narrowed to one status.
    pub fn list_content(
        &self,
        status: Option<ContentStatus>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ContentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{CONTENT_SELECT}
                 WHERE (?1 IS NULL OR c.status = ?1)
                 ORDER BY c.created_at DESC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![status.map(|s| s.as_str()), sql_int(limit), sql_int(offset)],
                    map_content,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_content(&self, status: Option<ContentStatus>) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM content WHERE (?1 IS NULL OR status = ?1)",
                params![status.map(|s| s.as_str())],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    /// Applies an editor's partial change. When the patch moves the status to
    /// a different value, the editor becomes the reviewer and the review time
    /// is stamped by the same UPDATE.
    pub fn update_content(
        &self,
        id: Uuid,
        patch: &ContentPatch,
        editor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<ContentRow>> {
        let tags = patch.tags.as_ref().map(serde_json::to_string).transpose()?;
        let now = timestamp::encode(&now);
        self.with_conn_mut(|conn| {
            // Right-hand expressions see the row as it was before the UPDATE,
            // so `status` in the CASE arms is the old status.
            let changed = conn.execute(
                "UPDATE content SET
                    title = COALESCE(?2, title),
                    description = COALESCE(?3, description),
                    body = COALESCE(?4, body),
                    source = COALESCE(?5, source),
                    source_url = COALESCE(?6, source_url),
                    author = COALESCE(?7, author),
                    tags = COALESCE(?8, tags),
                    review_notes = COALESCE(?10, review_notes),
                    reviewed_by = CASE WHEN ?9 IS NOT NULL AND ?9 != status THEN ?11 ELSE reviewed_by END,
                    last_reviewed_at = CASE WHEN ?9 IS NOT NULL AND ?9 != status THEN ?12 ELSE last_reviewed_at END,
                    status = COALESCE(?9, status),
                    updated_at = ?12
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    patch.title,
                    patch.description,
                    patch.body,
                    patch.source.map(|s| s.as_str()),
                    patch.source_url,
                    patch.author,
                    tags,
                    patch.status.map(|s| s.as_str()),
                    patch.review_notes,
                    editor.to_string(),
                    now,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_content(conn, id)
        })
    }

    /// Records a review decision: status, notes, reviewer and review time
    /// change together or not at all.
    pub fn review_content(
        &self,
        id: Uuid,
        status: ContentStatus,
        notes: &str,
        reviewer: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<ContentRow>> {
        let now = timestamp::encode(&now);
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE content SET status = ?2, review_notes = ?3, reviewed_by = ?4,
                    last_reviewed_at = ?5, updated_at = ?5
                 WHERE id = ?1",
                params![id.to_string(), status.as_str(), notes, reviewer.to_string(), now],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_content(conn, id)
        })
    }

    pub fn delete_content(&self, id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM content WHERE id = ?1", [id.to_string()])?;
            Ok(changed > 0)
        })
    }
}

fn query_content(conn: &Connection, id: Uuid) -> Result<Option<ContentRow>> {
    let sql = format!("{CONTENT_SELECT} WHERE c.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([id.to_string()], map_content).optional()
}

fn user_ref(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<UserRef>> {
    let Some(id) = opt_uuid_col(row, idx)? else {
        return Ok(None);
    };
    Ok(Some(UserRef {
        id,
        name: row.get(idx + 1)?,
        email: row.get(idx + 2)?,
    }))
}

fn map_content(row: &Row<'_>) -> rusqlite::Result<ContentRow> {
    let raw_tags: String = row.get(9)?;
    let tags: Vec<String> = serde_json::from_str(&raw_tags).map_err(|e| conversion_error(9, e))?;

    Ok(ContentRow {
        id: uuid_col(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        body: row.get(3)?,
        source: enum_col(row, 4)?,
        source_url: row.get(5)?,
        author: row.get(6)?,
        status: enum_col(row, 7)?,
        review_notes: row.get(8)?,
        tags,
        created_at: ts_col(row, 10)?,
        updated_at: ts_col(row, 11)?,
        last_reviewed_at: opt_ts_col(row, 12)?,
        submitted_by: user_ref(row, 13)?,
        reviewed_by: user_ref(row, 16)?,
    })
}
