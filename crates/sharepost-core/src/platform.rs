use sharepost_types::models::{Channel, Post, PostList, Team, User};
use thiserror::Error;

/// Failure reported by a [`ChatPlatform`] call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid {entity}: {reason}")]
    Invalid { entity: &'static str, reason: String },

    /// A message-will-be-posted hook refused the post.
    #[error("{0}")]
    Rejected(String),

    #[error("store error: {0}")]
    Store(String),
}

impl PlatformError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    pub fn store<T: ToString>(msg: T) -> Self {
        Self::Store(msg.to_string())
    }
}

/// Capabilities the redistribution engine and permalink expander need from
/// the chat platform. Every call is synchronous; async hosts run callers on a
/// blocking pool.
pub trait ChatPlatform: Send + Sync {
    /// Base URL the deployment is reachable at, without a trailing slash.
    fn site_url(&self) -> Option<String>;

    fn server_version(&self) -> String;

    fn get_channel(&self, channel_id: &str) -> Result<Channel, PlatformError>;

    fn get_team(&self, team_id: &str) -> Result<Team, PlatformError>;

    fn get_user(&self, user_id: &str) -> Result<User, PlatformError>;

    fn get_post(&self, post_id: &str) -> Result<Post, PlatformError>;

    /// The whole thread containing `post_id`, root included.
    fn get_post_thread(&self, post_id: &str) -> Result<PostList, PlatformError>;

    /// Persist a new post. The returned post carries its assigned id.
    fn create_post(&self, post: Post) -> Result<Post, PlatformError>;

    fn update_post(&self, post: Post) -> Result<Post, PlatformError>;

    fn delete_post(&self, post_id: &str) -> Result<(), PlatformError>;

    /// Duplicate file records under new ids owned by `user_id`, in input order.
    fn copy_file_infos(&self, user_id: &str, file_ids: &[String]) -> Result<Vec<String>, PlatformError>;

    /// Show `post` to `user_id` only. Never persisted.
    fn send_ephemeral_post(&self, user_id: &str, post: Post);
}

impl<P: ChatPlatform + ?Sized> ChatPlatform for &P {
    fn site_url(&self) -> Option<String> {
        (**self).site_url()
    }

    fn server_version(&self) -> String {
        (**self).server_version()
    }

    fn get_channel(&self, channel_id: &str) -> Result<Channel, PlatformError> {
        (**self).get_channel(channel_id)
    }

    fn get_team(&self, team_id: &str) -> Result<Team, PlatformError> {
        (**self).get_team(team_id)
    }

    fn get_user(&self, user_id: &str) -> Result<User, PlatformError> {
        (**self).get_user(user_id)
    }

    fn get_post(&self, post_id: &str) -> Result<Post, PlatformError> {
        (**self).get_post(post_id)
    }

    fn get_post_thread(&self, post_id: &str) -> Result<PostList, PlatformError> {
        (**self).get_post_thread(post_id)
    }

    fn create_post(&self, post: Post) -> Result<Post, PlatformError> {
        (**self).create_post(post)
    }

    fn update_post(&self, post: Post) -> Result<Post, PlatformError> {
        (**self).update_post(post)
    }

    fn delete_post(&self, post_id: &str) -> Result<(), PlatformError> {
        (**self).delete_post(post_id)
    }

    fn copy_file_infos(&self, user_id: &str, file_ids: &[String]) -> Result<Vec<String>, PlatformError> {
        (**self).copy_file_infos(user_id, file_ids)
    }

    fn send_ephemeral_post(&self, user_id: &str, post: Post) {
        (**self).send_ephemeral_post(user_id, post)
    }
}
