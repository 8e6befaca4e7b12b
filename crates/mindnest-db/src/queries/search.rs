use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

use super::{enum_col, ts_col, uuid_col};
use crate::Database;
use crate::models::SearchRow;
use crate::timestamp;

impl Database {
    /// Records a search and drops everything but the user's newest `keep`
    /// entries.
    pub fn insert_search(&self, search: &SearchRow, keep: usize) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO search_history (id, user_id, query, search_type, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    search.id.to_string(),
                    search.user_id.to_string(),
                    search.query,
                    search.search_type.as_str(),
                    timestamp::encode(&search.timestamp),
                ],
            )?;
            tx.execute(
                "DELETE FROM search_history
                 WHERE user_id = ?1 AND id NOT IN (
                     SELECT id FROM search_history WHERE user_id = ?1
                     ORDER BY timestamp DESC, rowid DESC LIMIT ?2
                 )",
                params![search.user_id.to_string(), keep as i64],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Newest first.
    pub fn list_searches(&self, user_id: Uuid, limit: usize) -> Result<Vec<SearchRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, query, search_type, timestamp FROM search_history
                 WHERE user_id = ?1
                 ORDER BY timestamp DESC, rowid DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![user_id.to_string(), limit as i64], |row| {
                    Ok(SearchRow {
                        id: uuid_col(row, 0)?,
                        user_id: uuid_col(row, 1)?,
                        query: row.get(2)?,
                        search_type: enum_col(row, 3)?,
                        timestamp: ts_col(row, 4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Deletes one entry owned by `user_id`. Returns false when nothing matched.
    pub fn delete_search(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM search_history WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), user_id.to_string()],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn clear_searches(&self, user_id: Uuid) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM search_history WHERE user_id = ?1",
                [user_id.to_string()],
            )?;
            Ok(removed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use chrono::{DateTime, Duration, Utc};
    use mindnest_types::models::{AuthProvider, SearchType};

    fn seed_user(db: &Database) -> Uuid {
        let id = Uuid::new_v4();
        db.create_user(&NewUser {
            id,
            name: "Sam".into(),
            email: format!("{id}@example.com"),
            password_hash: None,
            otp: None,
            otp_expires_at: None,
            is_verified: true,
            provider: AuthProvider::Google,
            created_at: timestamp::now(),
        })
        .unwrap();
        id
    }

    fn search(user_id: Uuid, query: &str, at: DateTime<Utc>) -> SearchRow {
        SearchRow {
            id: Uuid::new_v4(),
            user_id,
            query: query.into(),
            search_type: SearchType::Scholar,
            timestamp: at,
        }
    }

    #[test]
    fn history_is_capped_to_newest_entries() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db);
        let base = timestamp::now();
        for i in 0..5 {
            db.insert_search(&search(user, &format!("q{i}"), base + Duration::seconds(i)), 3)
                .unwrap();
        }

        let history = db.list_searches(user, 50).unwrap();
        let queries: Vec<_> = history.iter().map(|s| s.query.as_str()).collect();
        assert_eq!(queries, ["q4", "q3", "q2"]);
        assert_eq!(history[0].search_type, SearchType::Scholar);
    }

    #[test]
    fn delete_is_scoped_to_owner() {
        let db = Database::open_in_memory().unwrap();
        let owner = seed_user(&db);
        let stranger = seed_user(&db);
        let entry = search(owner, "calm breathing", timestamp::now());
        db.insert_search(&entry, 50).unwrap();

        assert!(!db.delete_search(stranger, entry.id).unwrap());
        assert!(db.delete_search(owner, entry.id).unwrap());
        assert!(db.list_searches(owner, 50).unwrap().is_empty());
    }

    #[test]
    fn clear_removes_only_that_users_history() {
        let db = Database::open_in_memory().unwrap();
        let a = seed_user(&db);
        let b = seed_user(&db);
        db.insert_search(&search(a, "one", timestamp::now()), 50).unwrap();
        db.insert_search(&search(a, "two", timestamp::now()), 50).unwrap();
        db.insert_search(&search(b, "three", timestamp::now()), 50).unwrap();

        assert_eq!(db.clear_searches(a).unwrap(), 2);
        assert_eq!(db.list_searches(b, 50).unwrap().len(), 1);
    }
}
