use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                          TEXT PRIMARY KEY,
                name                        TEXT NOT NULL,
                email                       TEXT NOT NULL UNIQUE,
                password_hash               TEXT,
                otp                         TEXT,
                otp_expires_at              TEXT,
                is_verified                 INTEGER NOT NULL DEFAULT 0,
                reset_token_hash            TEXT,
                reset_expires_at            TEXT,
                role                        TEXT NOT NULL DEFAULT 'user',
                can_approve_content         INTEGER NOT NULL DEFAULT 0,
                can_edit_content            INTEGER NOT NULL DEFAULT 0,
                can_delete_content          INTEGER NOT NULL DEFAULT 0,
                can_manage_users            INTEGER NOT NULL DEFAULT 0,
                profile_visibility          TEXT NOT NULL DEFAULT 'public',
                data_sharing                INTEGER NOT NULL DEFAULT 1,
                ai_model_training           INTEGER NOT NULL DEFAULT 1,
                third_party_integrations    INTEGER NOT NULL DEFAULT 1,
                display_name                TEXT,
                use_display_name_in_chats   INTEGER NOT NULL DEFAULT 0,
                provider                    TEXT NOT NULL DEFAULT 'credentials',
                created_at                  TEXT NOT NULL
            );

            CREATE INDEX idx_users_created ON users(created_at DESC);
            CREATE INDEX idx_users_reset_token ON users(reset_token_hash);

            CREATE TABLE content (
                id                  TEXT PRIMARY KEY,
                title               TEXT NOT NULL,
                description         TEXT NOT NULL,
                body                TEXT NOT NULL,
                source              TEXT NOT NULL,
                source_url          TEXT,
                author              TEXT,
                submitted_by        TEXT REFERENCES users(id) ON DELETE SET NULL,
                reviewed_by         TEXT REFERENCES users(id) ON DELETE SET NULL,
                status              TEXT NOT NULL DEFAULT 'Pending',
                review_notes        TEXT,
                tags                TEXT NOT NULL DEFAULT '[]',
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL,
                last_reviewed_at    TEXT
            );

            CREATE INDEX idx_content_status_created ON content(status, created_at DESC);
            CREATE INDEX idx_content_created ON content(created_at DESC);

            CREATE TABLE groups (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                admin       TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE group_members (
                group_id    TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
                member      TEXT NOT NULL,
                joined_at   TEXT NOT NULL,
                PRIMARY KEY (group_id, member)
            );

            CREATE TABLE messages (
                id              TEXT PRIMARY KEY,
                group_id        TEXT NOT NULL REFERENCES groups(id),
                sender          TEXT NOT NULL,
                sender_email    TEXT NOT NULL,
                content         TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_messages_group ON messages(group_id, created_at);

            CREATE TABLE journal_entries (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                mood        TEXT NOT NULL,
                text        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_journal_user_created ON journal_entries(user_id, created_at DESC);

            CREATE TABLE search_history (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                query       TEXT NOT NULL,
                search_type TEXT NOT NULL DEFAULT 'google',
                timestamp   TEXT NOT NULL
            );

            CREATE INDEX idx_search_user_timestamp ON search_history(user_id, timestamp DESC);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
