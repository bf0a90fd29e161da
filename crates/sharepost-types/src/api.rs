use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Channel, Post, User};

// -- Auth --

/// Header set by the fronting platform on every authenticated request.
pub const USER_ID_HEADER: &str = "Mattermost-User-Id";

// -- Dialogs --

/// Interactive dialog submission as posted by the platform. Field lookup and
/// validation happen once, in the core's request parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitDialogRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub callback_id: String,
    pub state: String,
    pub user_id: String,
    pub channel_id: String,
    pub team_id: String,
    pub submission: HashMap<String, Value>,
    pub cancelled: bool,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserRequest {
    pub username: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_bot: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterUserResponse {
    pub user: User,
}

// -- Posts --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub channel_id: String,
    pub message: String,
    #[serde(default)]
    pub root_id: String,
    #[serde(default)]
    pub file_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostRejectedResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelPostsResponse {
    pub channel: Channel,
    pub posts: Vec<Post>,
}
