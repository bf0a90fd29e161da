use crate::Database;
use crate::models::{ChannelRow, FileInfoRow, PostRow, TeamRow, UserRow};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row};
use sharepost_types::models::{Channel, FileInfo, Post, Team, User};

const POST_COLUMNS: &str = "id, channel_id, user_id, root_id, parent_id, message, type, \
                            create_at, update_at, file_ids, props, attachments";

const FILE_COLUMNS: &str = "id, creator_id, post_id, name, extension, size, mime_type, path";

impl Database {
    // -- Teams --

    pub fn create_team(&self, team: &Team) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO teams (id, name, display_name) VALUES (?1, ?2, ?3)",
                (&team.id, &team.name, &team.display_name),
            )?;
            Ok(())
        })
    }

    pub fn get_team(&self, id: &str) -> Result<Option<Team>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, display_name FROM teams WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(TeamRow {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            display_name: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row.map(TeamRow::into_team))
        })
    }

    // -- Channels --

    pub fn create_channel(&self, channel: &Channel) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO channels (id, team_id, name, display_name, type) VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    &channel.id,
                    &channel.team_id,
                    &channel.name,
                    &channel.display_name,
                    channel.kind.as_str(),
                ),
            )?;
            Ok(())
        })
    }

    pub fn get_channel(&self, id: &str) -> Result<Option<Channel>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, team_id, name, display_name, type FROM channels WHERE id = ?1",
                    [id],
                    channel_row,
                )
                .optional()?;
            row.map(ChannelRow::into_channel).transpose()
        })
    }

    pub fn list_channels(&self, team_id: &str) -> Result<Vec<Channel>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, team_id, name, display_name, type FROM channels WHERE team_id = ?1 ORDER BY name",
            )?;
            let rows = stmt
                .query_map([team_id], channel_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(ChannelRow::into_channel).collect()
        })
    }

    // -- Users --

    pub fn create_user(&self, user: &User) -> Result<()> {
        let row = UserRow::from_user(user);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, nickname, first_name, last_name, is_bot)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    row.id,
                    row.username,
                    row.nickname,
                    row.first_name,
                    row.last_name,
                    row.is_bot
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    // -- Posts --

    /// Insert a post and claim its files in one transaction.
    pub fn insert_post(&self, post: &Post) -> Result<()> {
        let row = PostRow::from_post(post)?;
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                &format!(
                    "INSERT INTO posts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    POST_COLUMNS
                ),
                rusqlite::params![
                    row.id,
                    row.channel_id,
                    row.user_id,
                    row.root_id,
                    row.parent_id,
                    row.message,
                    row.kind,
                    row.create_at,
                    row.update_at,
                    row.file_ids,
                    row.props,
                    row.attachments
                ],
            )?;
            for file_id in &post.file_ids {
                tx.execute(
                    "UPDATE file_infos SET post_id = ?1 WHERE id = ?2",
                    (&row.id, file_id),
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Returns false when no post has this id.
    pub fn update_post(&self, post: &Post) -> Result<bool> {
        let row = PostRow::from_post(post)?;
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET channel_id = ?2, user_id = ?3, root_id = ?4, parent_id = ?5,
                    message = ?6, type = ?7, create_at = ?8, update_at = ?9, file_ids = ?10,
                    props = ?11, attachments = ?12
                 WHERE id = ?1",
                rusqlite::params![
                    row.id,
                    row.channel_id,
                    row.user_id,
                    row.root_id,
                    row.parent_id,
                    row.message,
                    row.kind,
                    row.create_at,
                    row.update_at,
                    row.file_ids,
                    row.props,
                    row.attachments
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Returns false when no post has this id.
    pub fn delete_post(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<Post>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS),
                    [id],
                    post_row,
                )
                .optional()?;
            row.map(PostRow::into_post).transpose()
        })
    }

    /// Root and every reply, oldest first.
    pub fn get_thread(&self, root_id: &str) -> Result<Vec<Post>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM posts WHERE id = ?1 OR root_id = ?1 ORDER BY create_at, id",
                POST_COLUMNS
            ))?;
            let rows = stmt
                .query_map([root_id], post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(PostRow::into_post).collect()
        })
    }

    /// Newest first.
    pub fn get_channel_posts(&self, channel_id: &str, limit: u32) -> Result<Vec<Post>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM posts WHERE channel_id = ?1 ORDER BY create_at DESC, id DESC LIMIT ?2",
                POST_COLUMNS
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![channel_id, limit], post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(PostRow::into_post).collect()
        })
    }

    // -- Files --

    pub fn insert_file_info(&self, file: &FileInfo) -> Result<()> {
        let row = FileInfoRow::from_file_info(file);
        self.with_conn_mut(|conn| {
            conn.execute(
                &format!("INSERT INTO file_infos ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)", FILE_COLUMNS),
                rusqlite::params![
                    row.id,
                    row.creator_id,
                    row.post_id,
                    row.name,
                    row.extension,
                    row.size,
                    row.mime_type,
                    row.path
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_file_info(&self, id: &str) -> Result<Option<FileInfo>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM file_infos WHERE id = ?1", FILE_COLUMNS),
                    [id],
                    file_info_row,
                )
                .optional()?;
            Ok(row.map(FileInfoRow::into_file_info))
        })
    }

    /// Duplicate each `(source, copy)` pair as a detached file owned by
    /// `user_id`. All or nothing: a missing source fails the whole batch.
    pub fn copy_file_infos(&self, user_id: &str, pairs: &[(String, String)]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            for (source, copy) in pairs {
                let copied = tx.execute(
                    "INSERT INTO file_infos (id, creator_id, post_id, name, extension, size, mime_type, path)
                     SELECT ?1, ?2, '', name, extension, size, mime_type, path
                     FROM file_infos WHERE id = ?3",
                    (copy, user_id, source),
                )?;
                if copied == 0 {
                    return Err(anyhow!("File not found: {}", source));
                }
            }
            tx.commit()?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, nickname, first_name, last_name, is_bot FROM users WHERE {} = ?1",
        column
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                nickname: row.get(2)?,
                first_name: row.get(3)?,
                last_name: row.get(4)?,
                is_bot: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row.map(UserRow::into_user))
}

fn channel_row(row: &Row<'_>) -> rusqlite::Result<ChannelRow> {
    Ok(ChannelRow {
        id: row.get(0)?,
        team_id: row.get(1)?,
        name: row.get(2)?,
        display_name: row.get(3)?,
        kind: row.get(4)?,
    })
}

fn post_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        user_id: row.get(2)?,
        root_id: row.get(3)?,
        parent_id: row.get(4)?,
        message: row.get(5)?,
        kind: row.get(6)?,
        create_at: row.get(7)?,
        update_at: row.get(8)?,
        file_ids: row.get(9)?,
        props: row.get(10)?,
        attachments: row.get(11)?,
    })
}

fn file_info_row(row: &Row<'_>) -> rusqlite::Result<FileInfoRow> {
    Ok(FileInfoRow {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        post_id: row.get(2)?,
        name: row.get(3)?,
        extension: row.get(4)?,
        size: row.get(5)?,
        mime_type: row.get(6)?,
        path: row.get(7)?,
    })
}
