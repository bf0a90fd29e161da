//! Message-will-be-posted hook that turns a pasted permalink into a quote.
//!
//! Only the first self-link in a post is expanded: every expansion copies the
//! quoted post's files onto the new post, and the platform caps the number of
//! files per post. Copying past that cap is not guarded here.

use regex::Regex;
use serde_json::Value;
use sharepost_types::models::{ADDITIONAL_TEXT_PROP, Channel, Post, QuoteAttachment, User};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PluginConfig;
use crate::platform::{ChatPlatform, PlatformError};

/// Footer timestamp, e.g. `Mon 2 Jan 2006 at 15:04:05 UTC`.
/// Always UTC, not the reader's local time.
pub const FOOTER_TIME_FORMAT: &str = "%a %-d %b %Y at %H:%M:%S %Z";

/// Why a post was refused. The text is shown to the sender as-is.
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("{0}")]
    Upstream(#[from] PlatformError),

    #[error("invalid self-link pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl ExpandError {
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

pub struct PermalinkExpander<'a, P: ?Sized> {
    platform: &'a P,
    config: &'a PluginConfig,
}

impl<'a, P: ChatPlatform + ?Sized> PermalinkExpander<'a, P> {
    pub fn new(platform: &'a P, config: &'a PluginConfig) -> Self {
        Self { platform, config }
    }

    /// Expand the first self-link in `post`, then prepend any additional text.
    /// An error blocks the post: it is never persisted unexpanded.
    pub fn message_will_be_posted(&self, mut post: Post) -> Result<Post, ExpandError> {
        if let Some(link) = self.first_self_link(&post)? {
            self.expand(&mut post, &link)?;
        }

        // Must run after expansion so links inside the additional text stay as typed.
        apply_additional_text(&mut post);
        Ok(post)
    }

    fn first_self_link(&self, post: &Post) -> Result<Option<String>, ExpandError> {
        let channel = self.platform.get_channel(&post.channel_id)?;
        if channel.team_id.is_empty() {
            debug!("Channel {} has no team, skipping permalink expansion", channel.id);
            return Ok(None);
        }
        let team = self.platform.get_team(&channel.team_id)?;

        let pattern = self_link_pattern(&self.config.self_link(&team.name))?;
        Ok(pattern.find(&post.message).map(|m| m.as_str().to_string()))
    }

    fn expand(&self, post: &mut Post, link: &str) -> Result<(), ExpandError> {
        let quoted_id = linked_post_id(link);
        let quoted = self.platform.get_post(quoted_id)?;

        let new_file_ids = self
            .platform
            .copy_file_infos(&post.user_id, &quoted.file_ids)
            .map_err(|e| {
                warn!("Failed to copy file ids of post {}: {}", quoted.id, e);
                e
            })?;
        post.file_ids.extend(new_file_ids);

        let channel = self.platform.get_channel(&quoted.channel_id)?;
        let author = self.platform.get_user(&quoted.user_id)?;

        debug!("Expanding permalink to post {} in ~{}", quoted.id, channel.name);
        post.attachments = vec![quote_attachment(self.config, &quoted, &channel, &author)];
        Ok(())
    }
}

/// Render `quoted` as it appears under a post that links to it.
pub fn quote_attachment(
    config: &PluginConfig,
    quoted: &Post,
    channel: &Channel,
    author: &User,
) -> QuoteAttachment {
    let author_name = if author.is_bot {
        author.username.clone()
    } else {
        author.display_name_with_prefix("@")
    };
    let posted_at = quoted.created_at().unwrap_or_default();

    QuoteAttachment {
        author_name,
        author_icon: config.avatar_url(&author.id),
        timestamp: quoted.create_at,
        text: quoted.message.clone(),
        footer: format!(
            "Posted in ~{} on {}",
            channel.name,
            posted_at.format(FOOTER_TIME_FORMAT)
        ),
    }
}

/// `{selfLink}` followed by one or more path segments. Segments are ASCII
/// word characters only, so text typed right after a link is not swallowed.
pub fn self_link_pattern(self_link: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"{}/[A-Za-z0-9_/]+", regex::escape(self_link)))
}

/// Last path segment of a matched link.
pub fn linked_post_id(link: &str) -> &str {
    link.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

/// Prepend the reserved additional-text property to the body and consume it.
pub fn apply_additional_text(post: &mut Post) {
    match post.remove_prop(ADDITIONAL_TEXT_PROP) {
        Some(Value::String(text)) => post.message = format!("{}{}", text, post.message),
        Some(other) => warn!("Ignoring non-string additional text on post: {}", other),
        None => {}
    }
}
