use sharepost_types::models::{Channel, Post, PostList, Team, User};
use tracing::info;

use crate::config::PluginConfig;
use crate::expander::PermalinkExpander;
use crate::platform::{ChatPlatform, PlatformError};

/// Runs the permalink expander on every `create_post`, the way the platform
/// invokes message-will-be-posted hooks. Everything else passes through.
pub struct HookedPlatform<'a, P: ?Sized> {
    inner: &'a P,
    config: &'a PluginConfig,
}

impl<'a, P: ChatPlatform + ?Sized> HookedPlatform<'a, P> {
    pub fn new(inner: &'a P, config: &'a PluginConfig) -> Self {
        Self { inner, config }
    }
}

impl<P: ChatPlatform + ?Sized> ChatPlatform for HookedPlatform<'_, P> {
    fn site_url(&self) -> Option<String> {
        self.inner.site_url()
    }

    fn server_version(&self) -> String {
        self.inner.server_version()
    }

    fn get_channel(&self, channel_id: &str) -> Result<Channel, PlatformError> {
        self.inner.get_channel(channel_id)
    }

    fn get_team(&self, team_id: &str) -> Result<Team, PlatformError> {
        self.inner.get_team(team_id)
    }

    fn get_user(&self, user_id: &str) -> Result<User, PlatformError> {
        self.inner.get_user(user_id)
    }

    fn get_post(&self, post_id: &str) -> Result<Post, PlatformError> {
        self.inner.get_post(post_id)
    }

    fn get_post_thread(&self, post_id: &str) -> Result<PostList, PlatformError> {
        self.inner.get_post_thread(post_id)
    }

    fn create_post(&self, post: Post) -> Result<Post, PlatformError> {
        let post = PermalinkExpander::new(self.inner, self.config)
            .message_will_be_posted(post)
            .map_err(|e| {
                info!("Post rejected by permalink expander: {}", e);
                PlatformError::Rejected(e.reason())
            })?;
        self.inner.create_post(post)
    }

    fn update_post(&self, post: Post) -> Result<Post, PlatformError> {
        self.inner.update_post(post)
    }

    fn delete_post(&self, post_id: &str) -> Result<(), PlatformError> {
        self.inner.delete_post(post_id)
    }

    fn copy_file_infos(&self, user_id: &str, file_ids: &[String]) -> Result<Vec<String>, PlatformError> {
        self.inner.copy_file_infos(user_id, file_ids)
    }

    fn send_ephemeral_post(&self, user_id: &str, post: Post) {
        self.inner.send_ephemeral_post(user_id, post)
    }
}
