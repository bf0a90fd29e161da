use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Seeded team and channels, so a fresh server has somewhere to post.
pub const DEFAULT_TEAM_ID: &str = "00000000000000000000000000000001";
pub const TOWN_SQUARE_ID: &str = "00000000000000000000000000000002";
pub const OFF_TOPIC_ID: &str = "00000000000000000000000000000003";

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE teams (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL UNIQUE,
                display_name    TEXT NOT NULL
            );

            CREATE TABLE channels (
                id              TEXT PRIMARY KEY,
                team_id         TEXT NOT NULL DEFAULT '',
                name            TEXT NOT NULL,
                display_name    TEXT NOT NULL,
                type            TEXT NOT NULL DEFAULT 'O',
                UNIQUE(team_id, name)
            );

            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                nickname        TEXT NOT NULL DEFAULT '',
                first_name      TEXT NOT NULL DEFAULT '',
                last_name       TEXT NOT NULL DEFAULT '',
                is_bot          INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE posts (
                id              TEXT PRIMARY KEY,
                channel_id      TEXT NOT NULL REFERENCES channels(id),
                user_id         TEXT NOT NULL REFERENCES users(id),
                root_id         TEXT NOT NULL DEFAULT '',
                parent_id       TEXT NOT NULL DEFAULT '',
                message         TEXT NOT NULL,
                type            TEXT NOT NULL DEFAULT '',
                create_at       INTEGER NOT NULL,
                update_at       INTEGER NOT NULL,
                file_ids        TEXT NOT NULL DEFAULT '[]',
                props           TEXT NOT NULL DEFAULT '{}',
                attachments     TEXT NOT NULL DEFAULT '[]'
            );

            CREATE INDEX idx_posts_channel ON posts(channel_id, create_at);
            CREATE INDEX idx_posts_root ON posts(root_id);

            CREATE TABLE file_infos (
                id              TEXT PRIMARY KEY,
                creator_id      TEXT NOT NULL,
                post_id         TEXT NOT NULL DEFAULT '',
                name            TEXT NOT NULL,
                extension       TEXT NOT NULL DEFAULT '',
                size            INTEGER NOT NULL DEFAULT 0,
                mime_type       TEXT NOT NULL DEFAULT '',
                path            TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;

        conn.execute(
            "INSERT OR IGNORE INTO teams (id, name, display_name) VALUES (?1, 'main', 'Main')",
            [DEFAULT_TEAM_ID],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO channels (id, team_id, name, display_name) VALUES (?1, ?2, 'town-square', 'Town Square')",
            [TOWN_SQUARE_ID, DEFAULT_TEAM_ID],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO channels (id, team_id, name, display_name) VALUES (?1, ?2, 'off-topic', 'Off-Topic')",
            [OFF_TOPIC_ID, DEFAULT_TEAM_ID],
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
