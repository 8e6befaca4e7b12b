use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use mindnest_types::models::{Permissions, PrivacySettings, Role};

use super::{OptionalExt, enum_col, opt_ts, opt_ts_col, sql_int, ts_col, uuid_col};
use crate::Database;
use crate::models::{NewUser, UserRow};
use crate::timestamp;

const USER_COLUMNS: &str = "id, name, email, password_hash, otp, otp_expires_at, is_verified,
    reset_token_hash, reset_expires_at, role, can_approve_content, can_edit_content,
    can_delete_content, can_manage_users, profile_visibility, data_sharing, ai_model_training,
    third_party_integrations, display_name, use_display_name_in_chats, provider, created_at";

impl Database {
    pub fn create_user(&self, user: &NewUser) -> Result<()> {
        self.with_conn_mut(|conn| insert_user(conn, user))
    }

    /// Inserts `user` unless its e-mail is taken. The check and the insert
    /// share one writer transaction, so of two racing signups only one wins.
    /// Returns false when the address already belongs to an account.
    pub fn register_user(&self, user: &NewUser) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            if query_user(&tx, "email = ?1", &user.email)?.is_some() {
                return Ok(false);
            }
            insert_user(&tx, user)?;
            tx.commit()?;
            Ok(true)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", &email))
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", &id.to_string()))
    }

    /// Looks a user up by e-mail and inserts `user` when nobody owns it yet.
    /// Used by external sign-in, where the first login creates the account.
    pub fn find_or_create_user(&self, user: &NewUser) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            if query_user(&tx, "email = ?1", &user.email)?.is_none() {
                insert_user(&tx, user)?;
            }
            let row = query_user(&tx, "email = ?1", &user.email)?
                .ok_or_else(|| anyhow::anyhow!("user vanished during sign-in: {}", user.email))?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn set_otp(&self, user_id: Uuid, otp: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET otp = ?2, otp_expires_at = ?3 WHERE id = ?1",
                params![user_id.to_string(), otp, timestamp::encode(&expires_at)],
            )?;
            Ok(())
        })
    }

    /// Marks the user verified and clears the code in one statement, so a
    /// code can only ever be redeemed once. Returns the updated user when the
    /// code matched and had not expired.
    pub fn consume_otp(&self, email: &str, otp: &str, now: DateTime<Utc>) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET is_verified = 1, otp = NULL, otp_expires_at = NULL
                 WHERE email = ?1 AND otp = ?2 AND otp_expires_at > ?3",
                params![email, otp, timestamp::encode(&now)],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user(conn, "email = ?1", &email)
        })
    }

    pub fn set_reset_token(&self, user_id: Uuid, token_hash: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET reset_token_hash = ?2, reset_expires_at = ?3 WHERE id = ?1",
                params![user_id.to_string(), token_hash, timestamp::encode(&expires_at)],
            )?;
            Ok(())
        })
    }

    /// Replaces the password of whoever holds an unexpired reset token and
    /// clears the token. Returns false when no such token exists.
    pub fn consume_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password_hash = ?2, reset_token_hash = NULL, reset_expires_at = NULL
                 WHERE reset_token_hash = ?1 AND reset_expires_at > ?3",
                params![token_hash, password_hash, timestamp::encode(&now)],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET password_hash = ?2 WHERE id = ?1",
                params![user_id.to_string(), password_hash],
            )?;
            Ok(())
        })
    }

    pub fn update_role_and_permissions(
        &self,
        user_id: Uuid,
        role: Role,
        permissions: Permissions,
    ) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET role = ?2, can_approve_content = ?3, can_edit_content = ?4,
                    can_delete_content = ?5, can_manage_users = ?6
                 WHERE id = ?1",
                params![
                    user_id.to_string(),
                    role.as_str(),
                    permissions.can_approve_content,
                    permissions.can_edit_content,
                    permissions.can_delete_content,
                    permissions.can_manage_users,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user(conn, "id = ?1", &user_id.to_string())
        })
    }

    pub fn update_privacy(
        &self,
        user_id: Uuid,
        privacy: &PrivacySettings,
        display_name: Option<&str>,
        use_display_name_in_chats: bool,
    ) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET profile_visibility = ?2, data_sharing = ?3, ai_model_training = ?4,
                    third_party_integrations = ?5, display_name = ?6, use_display_name_in_chats = ?7
                 WHERE id = ?1",
                params![
                    user_id.to_string(),
                    privacy.profile_visibility.as_str(),
                    privacy.data_sharing,
                    privacy.ai_model_training,
                    privacy.third_party_integrations,
                    display_name,
                    use_display_name_in_chats,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user(conn, "id = ?1", &user_id.to_string())
        })
    }

    /// Newest accounts first, optionally narrowed to one role.
    pub fn list_users(&self, role: Option<Role>, offset: u64, limit: u64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE (?1 IS NULL OR role = ?1)
                 ORDER BY created_at DESC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![role.map(|r| r.as_str()), sql_int(limit), sql_int(offset)],
                    map_user,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_users(&self, role: Option<Role>) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE (?1 IS NULL OR role = ?1)",
                params![role.map(|r| r.as_str())],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    /// Grants the admin role and every permission to an existing account.
    pub fn promote_to_admin(&self, email: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET role = 'admin', can_approve_content = 1, can_edit_content = 1,
                    can_delete_content = 1, can_manage_users = 1
                 WHERE email = ?1",
                [email],
            )?;
            Ok(changed > 0)
        })
    }
}

fn insert_user(conn: &Connection, user: &NewUser) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, otp, otp_expires_at, is_verified, provider, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.id.to_string(),
            user.name,
            user.email,
            user.password_hash,
            user.otp,
            opt_ts(user.otp_expires_at.as_ref()),
            user.is_verified,
            user.provider.as_str(),
            timestamp::encode(&user.created_at),
        ],
    )?;
    Ok(())
}

fn query_user(conn: &Connection, filter: &str, value: &dyn rusqlite::ToSql) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {filter}");
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([value], map_user).optional()
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        otp: row.get(4)?,
        otp_expires_at: opt_ts_col(row, 5)?,
        is_verified: row.get(6)?,
        reset_token_hash: row.get(7)?,
        reset_expires_at: opt_ts_col(row, 8)?,
        role: enum_col(row, 9)?,
        permissions: Permissions {
            can_approve_content: row.get(10)?,
            can_edit_content: row.get(11)?,
            can_delete_content: row.get(12)?,
            can_manage_users: row.get(13)?,
        },
        privacy: PrivacySettings {
            profile_visibility: enum_col(row, 14)?,
            data_sharing: row.get(15)?,
            ai_model_training: row.get(16)?,
            third_party_integrations: row.get(17)?,
        },
        display_name: row.get(18)?,
        use_display_name_in_chats: row.get(19)?,
        provider: enum_col(row, 20)?,
        created_at: ts_col(row, 21)?,
    })
}
