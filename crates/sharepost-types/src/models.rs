use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved property that carries dialog "additional text" from post creation
/// to the permalink expander. The value is prepended verbatim to the body
/// once expansion has run, then removed.
pub const ADDITIONAL_TEXT_PROP: &str = "sharepost.additional_text";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostKind {
    #[default]
    #[serde(rename = "")]
    Default,
    #[serde(rename = "system_generic")]
    SystemGeneric,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "",
            Self::SystemGeneric => "system_generic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(Self::Default),
            "system_generic" => Some(Self::SystemGeneric),
            _ => None,
        }
    }
}

/// A rendered quote of another post, shown alongside a post body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteAttachment {
    pub author_name: String,
    pub author_icon: String,
    /// Creation time of the quoted post, Unix milliseconds.
    pub timestamp: i64,
    pub text: String,
    pub footer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    /// Empty until the platform persists the post.
    pub id: String,
    pub channel_id: String,
    pub user_id: String,
    /// Empty for a thread root.
    pub root_id: String,
    pub parent_id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub create_at: i64,
    pub update_at: i64,
    pub file_ids: Vec<String>,
    pub props: Map<String, Value>,
    pub attachments: Vec<QuoteAttachment>,
}

impl Post {
    pub fn new(channel_id: impl Into<String>, user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            user_id: user_id.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn is_root(&self) -> bool {
        self.root_id.is_empty()
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn set_prop(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.props.insert(key.into(), value.into());
    }

    pub fn remove_prop(&mut self, key: &str) -> Option<Value> {
        self.props.remove(key)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.create_at).single()
    }
}

/// A thread as returned by the platform: an ordering plus the posts it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostList {
    pub order: Vec<String>,
    pub posts: HashMap<String, Post>,
}

impl PostList {
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Post> {
        self.posts.get(id)
    }

    pub fn root(&self) -> Option<&Post> {
        self.posts.values().find(|p| p.is_root())
    }

    /// Drop repeated ids and ids with no matching post, keeping first occurrences.
    pub fn unique_order(&mut self) {
        let mut seen = HashSet::new();
        let posts = &self.posts;
        self.order
            .retain(|id| posts.contains_key(id) && seen.insert(id.clone()));
    }

    /// Oldest first; ties broken by id so the order is deterministic.
    pub fn sort_by_create_at(&mut self) {
        let posts = &self.posts;
        self.order.sort_by(|a, b| {
            let ka = posts.get(a).map(|p| p.create_at).unwrap_or(i64::MAX);
            let kb = posts.get(b).map(|p| p.create_at).unwrap_or(i64::MAX);
            ka.cmp(&kb).then_with(|| a.cmp(b))
        });
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    #[default]
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "P")]
    Private,
    #[serde(rename = "D")]
    Direct,
    #[serde(rename = "G")]
    Group,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "O",
            Self::Private => "P",
            Self::Direct => "D",
            Self::Group => "G",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "O" => Some(Self::Open),
            "P" => Some(Self::Private),
            "D" => Some(Self::Direct),
            "G" => Some(Self::Group),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    /// Empty for direct and group channels.
    pub team_id: String,
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub username: String,
    pub nickname: String,
    pub first_name: String,
    pub last_name: String,
    pub is_bot: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => String::new(),
        }
    }

    /// Nickname, then full name, then the prefixed username.
    pub fn display_name_with_prefix(&self, prefix: &str) -> String {
        if !self.nickname.is_empty() {
            return self.nickname.clone();
        }
        let full_name = self.full_name();
        if !full_name.is_empty() {
            return full_name;
        }
        format!("{}{}", prefix, self.username)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: String,
    pub creator_id: String,
    /// Empty until the file is attached to a persisted post.
    pub post_id: String,
    pub name: String,
    pub extension: String,
    pub size: i64,
    pub mime_type: String,
    pub path: String,
}
