use serde::{Deserialize, Serialize};

use crate::models::Post;

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PlatformEvent {
    /// Server confirms the connection
    Hello { user_id: String },

    /// A post was persisted
    Posted { post: Post },

    /// A post was updated in place
    PostEdited { post: Post },

    /// A post was deleted
    PostDeleted { post_id: String, channel_id: String },

    /// Feedback visible only to one user, never persisted
    Ephemeral { user_id: String, post: Post },
}

impl PlatformEvent {
    /// Returns the user this event is addressed to.
    /// Events that return `None` are delivered to every connection.
    pub fn target_user(&self) -> Option<&str> {
        match self {
            Self::Ephemeral { user_id, .. } => Some(user_id),
            Self::Hello { user_id } => Some(user_id),
            _ => None,
        }
    }
}
