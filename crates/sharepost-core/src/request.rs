use serde_json::Value;
use sharepost_types::api::SubmitDialogRequest;

use crate::error::RedistributeError;

pub const TO_CHANNEL_KEY: &str = "to_channel";
pub const SHARE_TYPE_KEY: &str = "share_type";
pub const ADDITIONAL_TEXT_KEY: &str = "additional_text";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareKind {
    /// Copy a quote of the post into another channel.
    Share,
    /// Relocate the post and its replies.
    Move,
}

impl ShareKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "share" => Some(Self::Share),
            "move" => Some(Self::Move),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Share => "share",
            Self::Move => "move",
        }
    }
}

/// One validated share/move submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedistributionRequest {
    pub user_id: String,
    pub team_id: String,
    /// Channel the dialog was opened from.
    pub channel_id: String,
    pub post_id: String,
    pub to_channel: String,
    pub kind: ShareKind,
    /// Already formatted as a leading paragraph.
    pub additional_text: Option<String>,
}

impl RedistributionRequest {
    pub fn from_dialog(req: &SubmitDialogRequest) -> Result<Self, RedistributeError> {
        if req.cancelled {
            return Err(RedistributeError::invalid("dialog was cancelled"));
        }

        let user_id = required(&req.user_id, "user_id")?;
        let team_id = required(&req.team_id, "team_id")?;
        let channel_id = required(&req.channel_id, "channel_id")?;
        let post_id = required(&req.callback_id, "callback_id")?;

        let to_channel = submission_str(req, TO_CHANNEL_KEY)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                RedistributeError::invalid(format!(
                    "failed to get {} key. Value is: {:?}",
                    TO_CHANNEL_KEY,
                    req.submission.get(TO_CHANNEL_KEY)
                ))
            })?;

        let share_type = submission_str(req, SHARE_TYPE_KEY).ok_or_else(|| {
            RedistributeError::invalid(format!(
                "failed to get {} key. Value is: {:?}",
                SHARE_TYPE_KEY,
                req.submission.get(SHARE_TYPE_KEY)
            ))
        })?;
        let kind = ShareKind::parse(share_type)
            .ok_or_else(|| RedistributeError::invalid(format!("invalid share_type {}", share_type)))?;

        let additional_text = submission_str(req, ADDITIONAL_TEXT_KEY)
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!("{}\n\n", s));

        Ok(Self {
            user_id,
            team_id,
            channel_id,
            post_id,
            to_channel: to_channel.to_string(),
            kind,
            additional_text,
        })
    }
}

fn required(value: &str, field: &str) -> Result<String, RedistributeError> {
    if value.is_empty() {
        return Err(RedistributeError::invalid(format!("missing {}", field)));
    }
    Ok(value.to_string())
}

fn submission_str<'a>(req: &'a SubmitDialogRequest, key: &str) -> Option<&'a str> {
    req.submission.get(key).and_then(Value::as_str)
}
