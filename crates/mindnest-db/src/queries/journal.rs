use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Row, params};
use uuid::Uuid;

use super::{ts_col, uuid_col};
use crate::Database;
use crate::models::JournalEntryRow;
use crate::timestamp;

const JOURNAL_COLUMNS: &str = "id, user_id, mood, text, created_at";

impl Database {
    pub fn insert_journal_entry(&self, entry: &JournalEntryRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO journal_entries (id, user_id, mood, text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.id.to_string(),
                    entry.user_id.to_string(),
                    entry.mood,
                    entry.text,
                    timestamp::encode(&entry.created_at),
                ],
            )?;
            Ok(())
        })
    }

    /// All entries of a user, newest first.
    pub fn journal_entries_for_user(&self, user_id: Uuid) -> Result<Vec<JournalEntryRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {JOURNAL_COLUMNS} FROM journal_entries
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id.to_string()], map_entry)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Entries of a user created within `[start, end]`, oldest first.
    pub fn journal_entries_between(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<JournalEntryRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {JOURNAL_COLUMNS} FROM journal_entries
                 WHERE user_id = ?1 AND created_at >= ?2 AND created_at <= ?3
                 ORDER BY created_at, rowid"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![
                        user_id.to_string(),
                        timestamp::encode(&start),
                        timestamp::encode(&end)
                    ],
                    map_entry,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn map_entry(row: &Row<'_>) -> rusqlite::Result<JournalEntryRow> {
    Ok(JournalEntryRow {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        mood: row.get(2)?,
        text: row.get(3)?,
        created_at: ts_col(row, 4)?,
    })
}
