use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::platform::ChatPlatform;

/// Oldest platform release that supports everything the plugin calls.
pub const MINIMUM_SERVER_VERSION: &str = "5.16.0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    #[error("failed to parse server version {0:?}")]
    InvalidServerVersion(String),

    #[error("this plugin requires platform v{required} or later, found v{found}")]
    UnsupportedServerVersion { found: String, required: &'static str },

    #[error("site URL is not set; set a site URL and restart the plugin")]
    MissingSiteUrl,
}

/// Configuration snapshot handed to each operation. It is never mutated while
/// an operation runs; reloading means building a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    site_url: String,
}

impl PluginConfig {
    pub fn new(site_url: impl AsRef<str>) -> Self {
        Self {
            site_url: site_url.as_ref().trim_end_matches('/').to_string(),
        }
    }

    /// Validate the host platform and capture its configuration.
    pub fn activate<P: ChatPlatform + ?Sized>(platform: &P) -> Result<Self, ActivationError> {
        check_server_version(&platform.server_version())?;

        let site_url = platform
            .site_url()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ActivationError::MissingSiteUrl)?;

        let config = Self::new(site_url);
        info!("Plugin activated for {}", config.site_url);
        Ok(config)
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// `{siteURL}/{team}`: every permalink inside the team starts with this.
    pub fn self_link(&self, team_name: &str) -> String {
        format!("{}/{}", self.site_url, team_name)
    }

    pub fn post_link(&self, team_name: &str, post_id: &str) -> String {
        format!("{}/pl/{}", self.self_link(team_name), post_id)
    }

    pub fn avatar_url(&self, user_id: &str) -> String {
        format!("{}/api/v4/users/{}/image", self.site_url, user_id)
    }
}

pub fn check_server_version(found: &str) -> Result<(), ActivationError> {
    let version = parse_version(found)
        .ok_or_else(|| ActivationError::InvalidServerVersion(found.to_string()))?;
    let required = parse_version(MINIMUM_SERVER_VERSION).unwrap_or((0, 0, 0));

    if version < required {
        return Err(ActivationError::UnsupportedServerVersion {
            found: found.to_string(),
            required: MINIMUM_SERVER_VERSION,
        });
    }
    Ok(())
}

/// `major.minor.patch`, ignoring a `-pre` or `+build` suffix.
fn parse_version(s: &str) -> Option<(u64, u64, u64)> {
    let core = s.trim().split(['-', '+']).next()?;
    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}
