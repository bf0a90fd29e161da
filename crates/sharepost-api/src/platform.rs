//! [`ChatPlatform`] backed by the SQLite store, publishing every write to the
//! gateway.

use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;

use sharepost_core::{ChatPlatform, PlatformError};
use sharepost_db::Database;
use sharepost_gateway::Dispatcher;
use sharepost_types::events::PlatformEvent;
use sharepost_types::models::{Channel, Post, PostList, Team, User};

pub struct LocalPlatform<'a> {
    db: &'a Database,
    dispatcher: &'a Dispatcher,
    site_url: Option<&'a str>,
    server_version: &'a str,
}

impl<'a> LocalPlatform<'a> {
    pub fn new(
        db: &'a Database,
        dispatcher: &'a Dispatcher,
        site_url: Option<&'a str>,
        server_version: &'a str,
    ) -> Self {
        Self {
            db,
            dispatcher,
            site_url,
            server_version,
        }
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn store_error(e: anyhow::Error) -> PlatformError {
    error!("Store error: {:#}", e);
    PlatformError::store(e)
}

impl ChatPlatform for LocalPlatform<'_> {
    fn site_url(&self) -> Option<String> {
        self.site_url.map(str::to_string)
    }

    fn server_version(&self) -> String {
        self.server_version.to_string()
    }

    fn get_channel(&self, channel_id: &str) -> Result<Channel, PlatformError> {
        self.db
            .get_channel(channel_id)
            .map_err(store_error)?
            .ok_or_else(|| PlatformError::not_found("channel", channel_id))
    }

    fn get_team(&self, team_id: &str) -> Result<Team, PlatformError> {
        self.db
            .get_team(team_id)
            .map_err(store_error)?
            .ok_or_else(|| PlatformError::not_found("team", team_id))
    }

    fn get_user(&self, user_id: &str) -> Result<User, PlatformError> {
        self.db
            .get_user(user_id)
            .map_err(store_error)?
            .ok_or_else(|| PlatformError::not_found("user", user_id))
    }

    fn get_post(&self, post_id: &str) -> Result<Post, PlatformError> {
        self.db
            .get_post(post_id)
            .map_err(store_error)?
            .ok_or_else(|| PlatformError::not_found("post", post_id))
    }

    fn get_post_thread(&self, post_id: &str) -> Result<PostList, PlatformError> {
        let post = self.get_post(post_id)?;
        let root_id = if post.is_root() { post.id } else { post.root_id };

        let posts = self.db.get_thread(&root_id).map_err(store_error)?;

        // Newest first, the way the platform hands threads out
        let mut list = PostList::default();
        for post in posts.into_iter().rev() {
            list.order.push(post.id.clone());
            list.posts.insert(post.id.clone(), post);
        }
        Ok(list)
    }

    fn create_post(&self, mut post: Post) -> Result<Post, PlatformError> {
        self.get_channel(&post.channel_id)?;
        if !post.root_id.is_empty() {
            let root = self.get_post(&post.root_id).map_err(|_| PlatformError::Invalid {
                entity: "post",
                reason: format!("root post {} does not exist", post.root_id),
            })?;
            if root.channel_id != post.channel_id {
                return Err(PlatformError::Invalid {
                    entity: "post",
                    reason: format!("root post {} is in another channel", root.id),
                });
            }
        }

        post.id = new_id();
        let now = Utc::now().timestamp_millis();
        if post.create_at == 0 {
            post.create_at = now;
        }
        if post.update_at == 0 {
            post.update_at = post.create_at;
        }

        self.db.insert_post(&post).map_err(store_error)?;
        debug!("Created post {} in {}", post.id, post.channel_id);

        self.dispatcher.broadcast(PlatformEvent::Posted { post: post.clone() });
        Ok(post)
    }

    fn update_post(&self, mut post: Post) -> Result<Post, PlatformError> {
        post.update_at = Utc::now().timestamp_millis();
        if !self.db.update_post(&post).map_err(store_error)? {
            return Err(PlatformError::not_found("post", &post.id));
        }

        self.dispatcher.broadcast(PlatformEvent::PostEdited { post: post.clone() });
        Ok(post)
    }

    fn delete_post(&self, post_id: &str) -> Result<(), PlatformError> {
        let post = self.get_post(post_id)?;
        if !self.db.delete_post(post_id).map_err(store_error)? {
            return Err(PlatformError::not_found("post", post_id));
        }

        self.dispatcher.broadcast(PlatformEvent::PostDeleted {
            post_id: post.id,
            channel_id: post.channel_id,
        });
        Ok(())
    }

    fn copy_file_infos(&self, user_id: &str, file_ids: &[String]) -> Result<Vec<String>, PlatformError> {
        let pairs: Vec<(String, String)> = file_ids.iter().map(|id| (id.clone(), new_id())).collect();
        self.db.copy_file_infos(user_id, &pairs).map_err(store_error)?;
        Ok(pairs.into_iter().map(|(_, copy)| copy).collect())
    }

    fn send_ephemeral_post(&self, user_id: &str, mut post: Post) {
        post.id = new_id();
        post.create_at = Utc::now().timestamp_millis();
        post.update_at = post.create_at;

        self.dispatcher.broadcast(PlatformEvent::Ephemeral {
            user_id: user_id.to_string(),
            post,
        });
    }
}
