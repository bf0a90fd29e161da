//! Database row types. These map directly to SQLite rows and are kept distinct
//! from the sharepost-types models so the storage layer stays independent;
//! the `into_*` / `from_*` helpers convert at the boundary.

use anyhow::{Result, anyhow};
use sharepost_types::models::{Channel, ChannelKind, FileInfo, Post, PostKind, Team, User};

pub struct TeamRow {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

pub struct ChannelRow {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub display_name: String,
    pub kind: String,
}

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub nickname: String,
    pub first_name: String,
    pub last_name: String,
    pub is_bot: bool,
}

/// File ids, props and attachments are stored as JSON text.
pub struct PostRow {
    pub id: String,
    pub channel_id: String,
    pub user_id: String,
    pub root_id: String,
    pub parent_id: String,
    pub message: String,
    pub kind: String,
    pub create_at: i64,
    pub update_at: i64,
    pub file_ids: String,
    pub props: String,
    pub attachments: String,
}

pub struct FileInfoRow {
    pub id: String,
    pub creator_id: String,
    pub post_id: String,
    pub name: String,
    pub extension: String,
    pub size: i64,
    pub mime_type: String,
    pub path: String,
}

impl TeamRow {
    pub fn into_team(self) -> Team {
        Team {
            id: self.id,
            name: self.name,
            display_name: self.display_name,
        }
    }
}

impl ChannelRow {
    pub fn into_channel(self) -> Result<Channel> {
        let kind = ChannelKind::parse(&self.kind)
            .ok_or_else(|| anyhow!("Corrupt type '{}' on channel '{}'", self.kind, self.id))?;
        Ok(Channel {
            id: self.id,
            team_id: self.team_id,
            name: self.name,
            display_name: self.display_name,
            kind,
        })
    }
}

impl UserRow {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            nickname: user.nickname.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_bot: user.is_bot,
        }
    }

    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            nickname: self.nickname,
            first_name: self.first_name,
            last_name: self.last_name,
            is_bot: self.is_bot,
        }
    }
}

impl PostRow {
    pub fn from_post(post: &Post) -> Result<Self> {
        Ok(Self {
            id: post.id.clone(),
            channel_id: post.channel_id.clone(),
            user_id: post.user_id.clone(),
            root_id: post.root_id.clone(),
            parent_id: post.parent_id.clone(),
            message: post.message.clone(),
            kind: post.kind.as_str().to_string(),
            create_at: post.create_at,
            update_at: post.update_at,
            file_ids: serde_json::to_string(&post.file_ids)?,
            props: serde_json::to_string(&post.props)?,
            attachments: serde_json::to_string(&post.attachments)?,
        })
    }

    pub fn into_post(self) -> Result<Post> {
        let kind = PostKind::parse(&self.kind)
            .ok_or_else(|| anyhow!("Corrupt type '{}' on post '{}'", self.kind, self.id))?;
        Ok(Post {
            file_ids: serde_json::from_str(&self.file_ids)?,
            props: serde_json::from_str(&self.props)?,
            attachments: serde_json::from_str(&self.attachments)?,
            id: self.id,
            channel_id: self.channel_id,
            user_id: self.user_id,
            root_id: self.root_id,
            parent_id: self.parent_id,
            message: self.message,
            kind,
            create_at: self.create_at,
            update_at: self.update_at,
        })
    }
}

impl FileInfoRow {
    pub fn from_file_info(file: &FileInfo) -> Self {
        Self {
            id: file.id.clone(),
            creator_id: file.creator_id.clone(),
            post_id: file.post_id.clone(),
            name: file.name.clone(),
            extension: file.extension.clone(),
            size: file.size,
            mime_type: file.mime_type.clone(),
            path: file.path.clone(),
        }
    }

    pub fn into_file_info(self) -> FileInfo {
        FileInfo {
            id: self.id,
            creator_id: self.creator_id,
            post_id: self.post_id,
            name: self.name,
            extension: self.extension,
            size: self.size,
            mime_type: self.mime_type,
            path: self.path,
        }
    }
}
