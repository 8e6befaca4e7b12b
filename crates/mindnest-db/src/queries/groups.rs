use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use super::{OptionalExt, ts_col, uuid_col};
use crate::Database;
use crate::models::{GroupRow, MessageRow};
use crate::timestamp;

impl Database {
    // -- Groups --

    /// Creates a group and enrolls `members` in the given order. Duplicate
    /// addresses are enrolled once.
    pub fn create_group(
        &self,
        id: Uuid,
        name: &str,
        admin: &str,
        members: &[String],
        now: DateTime<Utc>,
    ) -> Result<GroupRow> {
        let now = timestamp::encode(&now);
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO groups (id, name, admin, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
                params![id.to_string(), name, admin, now],
            )?;
            for member in members {
                tx.execute(
                    "INSERT OR IGNORE INTO group_members (group_id, member, joined_at) VALUES (?1, ?2, ?3)",
                    params![id.to_string(), member, now],
                )?;
            }
            let group = query_group(&tx, id)?
                .ok_or_else(|| anyhow::anyhow!("group {} missing after insert", id))?;
            tx.commit()?;
            Ok(group)
        })
    }

    pub fn get_group(&self, id: Uuid) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| query_group(conn, id))
    }

    pub fn list_groups(&self) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, admin, created_at, updated_at FROM groups ORDER BY created_at, rowid",
            )?;
            let mut groups = stmt
                .query_map([], map_group)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            // One pass over memberships instead of a query per group
            let mut stmt = conn.prepare(
                "SELECT group_id, member FROM group_members ORDER BY joined_at, rowid",
            )?;
            let mut members: HashMap<String, Vec<String>> = HashMap::new();
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
            for row in rows {
                let (group_id, member) = row?;
                members.entry(group_id).or_default().push(member);
            }

            for group in &mut groups {
                group.members = members.remove(&group.id.to_string()).unwrap_or_default();
            }
            Ok(groups)
        })
    }

    /// Returns false when the address was already a member.
    pub fn add_group_member(&self, group_id: Uuid, member: &str, now: DateTime<Utc>) -> Result<bool> {
        let now = timestamp::encode(&now);
        self.with_conn_mut(|conn| {
            let added = conn.execute(
                "INSERT OR IGNORE INTO group_members (group_id, member, joined_at) VALUES (?1, ?2, ?3)",
                params![group_id.to_string(), member, now],
            )?;
            if added > 0 {
                touch_group(conn, group_id, &now)?;
            }
            Ok(added > 0)
        })
    }

    /// Returns false when the address was not a member.
    pub fn remove_group_member(&self, group_id: Uuid, member: &str, now: DateTime<Utc>) -> Result<bool> {
        let now = timestamp::encode(&now);
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM group_members WHERE group_id = ?1 AND member = ?2",
                params![group_id.to_string(), member],
            )?;
            if removed > 0 {
                touch_group(conn, group_id, &now)?;
            }
            Ok(removed > 0)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, message: &MessageRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, group_id, sender, sender_email, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    message.id.to_string(),
                    message.group_id.to_string(),
                    message.sender,
                    message.sender_email,
                    message.content,
                    timestamp::encode(&message.created_at),
                ],
            )?;
            Ok(())
        })
    }

    /// Messages of a group in insertion-time order, optionally only those
    /// strictly newer than `after` (the polling cursor).
    pub fn get_messages(&self, group_id: Uuid, after: Option<DateTime<Utc>>) -> Result<Vec<MessageRow>> {
        let after = after.map(|ts| timestamp::encode(&ts));
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, group_id, sender, sender_email, content, created_at
                 FROM messages
                 WHERE group_id = ?1 AND (?2 IS NULL OR created_at > ?2)
                 ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map(params![group_id.to_string(), after], |row| {
                    Ok(MessageRow {
                        id: uuid_col(row, 0)?,
                        group_id: uuid_col(row, 1)?,
                        sender: row.get(2)?,
                        sender_email: row.get(3)?,
                        content: row.get(4)?,
                        created_at: ts_col(row, 5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn touch_group(conn: &Connection, group_id: Uuid, now: &str) -> Result<()> {
    conn.execute(
        "UPDATE groups SET updated_at = ?2 WHERE id = ?1",
        params![group_id.to_string(), now],
    )?;
    Ok(())
}

fn query_group(conn: &Connection, id: Uuid) -> Result<Option<GroupRow>> {
    let mut stmt =
        conn.prepare("SELECT id, name, admin, created_at, updated_at FROM groups WHERE id = ?1")?;
    let Some(mut group) = stmt.query_row([id.to_string()], map_group).optional()? else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT member FROM group_members WHERE group_id = ?1 ORDER BY joined_at, rowid",
    )?;
    group.members = stmt
        .query_map([id.to_string()], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(Some(group))
}

fn map_group(row: &Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        admin: row.get(2)?,
        members: Vec::new(),
        created_at: ts_col(row, 3)?,
        updated_at: ts_col(row, 4)?,
    })
}
