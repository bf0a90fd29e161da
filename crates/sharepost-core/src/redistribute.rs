//! Share and move operations behind the "Share post" dialog.
//!
//! A share posts a quote of the source post into another channel and touches
//! nothing else. A move clones the source thread into the destination channel
//! one post at a time, then rewrites the original root into a pointer to its new
//! location and deletes the original replies. If a reply fails to migrate, every
//! post the move created is deleted again and the original thread is left as
//! it was.
//!
//! Nested replies are flattened: every migrated reply is parented directly to
//! the new root. Two concurrent moves of the same thread are not serialized.

use std::fmt;

use chrono::Utc;
use sharepost_types::models::{ADDITIONAL_TEXT_PROP, Channel, Post, PostKind, Team};
use tracing::{debug, error, info, warn};

use crate::compensation::CompensationLog;
use crate::config::PluginConfig;
use crate::error::{Failure, RedistributeError};
use crate::platform::ChatPlatform;
use crate::request::{RedistributionRequest, ShareKind};

/// Expected, benign refusals. Shown to the user verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyRejection {
    /// The source is a reply; only a whole thread can move.
    ReplyInThread,
    /// Destination and source channel are the same.
    SameChannel,
}

impl PolicyRejection {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ReplyInThread => {
                "This post is a reply in a thread and cannot be moved to another channel on its own. Move the root post instead."
            }
            Self::SameChannel => "This post is already in the selected channel.",
        }
    }
}

impl fmt::Display for PolicyRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone)]
pub struct ShareReport {
    pub new_post: Post,
    pub destination: Channel,
    pub original_link: String,
    pub new_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedReply {
    pub original_id: String,
    pub new_id: String,
}

#[derive(Debug, Clone)]
pub struct MoveReport {
    pub new_root: Post,
    pub destination: Channel,
    /// In creation order.
    pub moved_replies: Vec<MovedReply>,
    /// Whether the original root was rewritten into a "moved" notice.
    pub marker_updated: bool,
    pub deleted_replies: Vec<String>,
    pub failed_deletes: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Shared(ShareReport),
    Moved(MoveReport),
    Rejected(PolicyRejection),
}

impl Outcome {
    /// Ephemeral text for the acting user, if any. A completed move says
    /// nothing: the rewritten original post announces it to the channel.
    pub fn feedback(&self) -> Option<String> {
        match self {
            Self::Shared(report) => Some(format!(
                "[This post]({}) is shared to ~{}. [New post]({}).",
                report.original_link, report.destination.name, report.new_link
            )),
            Self::Moved(_) => None,
            Self::Rejected(rejection) => Some(rejection.message().to_string()),
        }
    }
}

pub struct RedistributionEngine<'a, P: ?Sized> {
    platform: &'a P,
    config: &'a PluginConfig,
}

impl<'a, P: ChatPlatform + ?Sized> RedistributionEngine<'a, P> {
    pub fn new(platform: &'a P, config: &'a PluginConfig) -> Self {
        Self { platform, config }
    }

    /// Run the request and tell the acting user how it went.
    pub fn submit(&self, request: &RedistributionRequest) -> Result<Outcome, Failure> {
        let result = self.redistribute(request);

        let feedback = match &result {
            Ok(outcome) => outcome.feedback(),
            Err(failure) => {
                warn!(
                    "Failed to {} post {}: {}",
                    request.kind.as_str(),
                    request.post_id,
                    failure
                );
                Some(failure.user_message().to_string())
            }
        };

        if let Some(message) = feedback {
            send_ephemeral_message(self.platform, &request.channel_id, &request.user_id, message);
        }
        result
    }

    pub fn redistribute(&self, request: &RedistributionRequest) -> Result<Outcome, Failure> {
        match request.kind {
            ShareKind::Share => self.share(request).map(Outcome::Shared),
            ShareKind::Move => self.move_thread(request),
        }
    }

    fn share(&self, request: &RedistributionRequest) -> Result<ShareReport, Failure> {
        let channel = self.lookup_channel(&request.channel_id)?;
        let destination = self.lookup_channel(&request.to_channel)?;
        let team = self.lookup_team(&request.team_id)?;

        let original_link = self.config.post_link(&team.name, &request.post_id);
        let mut post = Post::new(
            &request.to_channel,
            &request.user_id,
            format!("> Shared from ~{}. ([original post]({}))", channel.name, original_link),
        );
        // Kept out of the body until expansion has run, see expander::apply_additional_text.
        if let Some(text) = &request.additional_text {
            post.set_prop(ADDITIONAL_TEXT_PROP, text.as_str());
        }

        let new_post = self.platform.create_post(post).map_err(|e| {
            warn!("Failed to create shared post in channel {}: {}", request.to_channel, e);
            RedistributeError::write("create post in channel", &request.to_channel, e)
        })?;

        info!(
            "Shared post {} from ~{} to ~{} as {}",
            request.post_id, channel.name, destination.name, new_post.id
        );
        Ok(ShareReport {
            new_link: self.config.post_link(&team.name, &new_post.id),
            original_link,
            destination,
            new_post,
        })
    }

    fn move_thread(&self, request: &RedistributionRequest) -> Result<Outcome, Failure> {
        let mut thread = self.platform.get_post_thread(&request.post_id).map_err(|e| {
            error!("Failed to get thread of post {}: {}", request.post_id, e);
            RedistributeError::lookup("thread", &request.post_id, e)
        })?;
        thread.unique_order();
        thread.sort_by_create_at();

        let source = match thread.get(&request.post_id) {
            Some(post) => post.clone(),
            None => self.platform.get_post(&request.post_id).map_err(|e| {
                error!("Failed to get post {}: {}", request.post_id, e);
                RedistributeError::lookup("post", &request.post_id, e)
            })?,
        };

        if !source.is_root() && thread.len() > 1 {
            info!("Refusing to move reply {} out of its thread", source.id);
            return Ok(Outcome::Rejected(PolicyRejection::ReplyInThread));
        }
        if source.channel_id == request.to_channel {
            info!("Refusing to move post {} into its own channel", source.id);
            return Ok(Outcome::Rejected(PolicyRejection::SameChannel));
        }

        let destination = self.lookup_channel(&request.to_channel)?;
        let team = self.lookup_team(&request.team_id)?;

        let mut root = self.clone_post(&source, &request.user_id)?;
        root.channel_id = destination.id.clone();
        root.root_id.clear();
        root.parent_id.clear();
        match &request.additional_text {
            Some(text) => root.set_prop(ADDITIONAL_TEXT_PROP, text.as_str()),
            None => {
                root.remove_prop(ADDITIONAL_TEXT_PROP);
            }
        }

        let new_root = self.platform.create_post(root).map_err(|e| {
            warn!("Failed to create moved post in channel {}: {}", destination.id, e);
            RedistributeError::write("create post in channel", &destination.id, e)
        })?;
        debug!("Created moved post {} from {}", new_root.id, source.id);

        let mut created = CompensationLog::new();
        created.record(&new_root.id);

        let mut moved_replies = Vec::new();
        for reply_id in thread.order.iter().filter(|id| **id != source.id) {
            match self.move_reply(reply_id, &new_root, &request.user_id) {
                Ok(new_reply) => {
                    created.record(&new_reply.id);
                    moved_replies.push(MovedReply {
                        original_id: reply_id.clone(),
                        new_id: new_reply.id,
                    });
                }
                Err(error) => {
                    warn!(
                        "Failed to move reply {} of post {}, rolling back {} created posts: {}",
                        reply_id,
                        source.id,
                        created.len(),
                        error
                    );
                    let rollback = created.rollback(self.platform);
                    return Err(Failure {
                        error,
                        rollback: Some(rollback),
                    });
                }
            }
        }
        if !moved_replies.is_empty() {
            debug!("Moved {} replies of post {}", moved_replies.len(), source.id);
        }

        // From here on the move is committed; failures are logged, not undone.
        let marker = self.moved_marker(source, &destination, &team, &new_root);
        let marker_updated = match self.platform.update_post(marker) {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to update moved post {}: {}", request.post_id, e);
                false
            }
        };

        let mut deleted_replies = Vec::new();
        let mut failed_deletes = Vec::new();
        for reply in &moved_replies {
            match self.platform.delete_post(&reply.original_id) {
                Ok(()) => deleted_replies.push(reply.original_id.clone()),
                Err(e) => {
                    warn!("Failed to delete post {}: {}", reply.original_id, e);
                    failed_deletes.push(reply.original_id.clone());
                }
            }
        }

        info!(
            "Moved post {} with {} replies to ~{} as {}",
            request.post_id,
            moved_replies.len(),
            destination.name,
            new_root.id
        );
        Ok(Outcome::Moved(MoveReport {
            new_root,
            destination,
            moved_replies,
            marker_updated,
            deleted_replies,
            failed_deletes,
        }))
    }

    fn move_reply(&self, reply_id: &str, new_root: &Post, user_id: &str) -> Result<Post, RedistributeError> {
        let original = self
            .platform
            .get_post(reply_id)
            .map_err(|e| RedistributeError::lookup("post", reply_id, e))?;

        let mut reply = self.clone_post(&original, user_id)?;
        reply.channel_id = new_root.channel_id.clone();
        reply.root_id = new_root.id.clone();
        reply.parent_id = new_root.id.clone();
        reply.remove_prop(ADDITIONAL_TEXT_PROP);

        self.platform
            .create_post(reply)
            .map_err(|e| RedistributeError::write("create reply to", &new_root.id, e))
    }

    /// Copy of `original` ready to be created: no id, a fresh update time and
    /// its files duplicated for `user_id`.
    pub fn clone_post(&self, original: &Post, user_id: &str) -> Result<Post, RedistributeError> {
        let file_ids = self
            .platform
            .copy_file_infos(user_id, &original.file_ids)
            .map_err(|e| {
                warn!("Failed to copy file ids of post {}: {}", original.id, e);
                RedistributeError::write("copy files of post", &original.id, e)
            })?;

        Ok(Post {
            id: String::new(),
            update_at: Utc::now().timestamp_millis(),
            file_ids,
            ..original.clone()
        })
    }

    fn moved_marker(&self, mut original: Post, destination: &Channel, team: &Team, new_root: &Post) -> Post {
        original.kind = PostKind::SystemGeneric;
        original.message = format!(
            "This post is moved to ~{}. [New post]({})",
            destination.name,
            self.config.post_link(&team.name, &new_root.id)
        );
        original.file_ids.clear();
        original.attachments.clear();
        original
    }

    fn lookup_channel(&self, channel_id: &str) -> Result<Channel, RedistributeError> {
        self.platform.get_channel(channel_id).map_err(|e| {
            error!("Failed to get channel {}: {}", channel_id, e);
            RedistributeError::lookup("channel", channel_id, e)
        })
    }

    fn lookup_team(&self, team_id: &str) -> Result<Team, RedistributeError> {
        self.platform.get_team(team_id).map_err(|e| {
            error!("Failed to get team {}: {}", team_id, e);
            RedistributeError::lookup("team", team_id, e)
        })
    }
}

/// Show `message` to `user_id` in `channel_id` without persisting it.
pub fn send_ephemeral_message<P: ChatPlatform + ?Sized>(
    platform: &P,
    channel_id: &str,
    user_id: &str,
    message: impl Into<String>,
) {
    platform.send_ephemeral_post(user_id, Post::new(channel_id, user_id, message));
}
