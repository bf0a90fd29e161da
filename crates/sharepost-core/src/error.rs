//! Error taxonomy for redistribution.
//!
//! Platform errors are converted at the point of call into one of these kinds
//! and logged there. None of their text reaches the end user: every failure is
//! shown as [`GENERIC_ERROR_MESSAGE`].

use thiserror::Error;

use crate::compensation::RollbackReport;
use crate::platform::PlatformError;

/// The only text a user sees when an operation fails.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again later.";

#[derive(Debug, Error)]
pub enum RedistributeError {
    /// Malformed or unrecognized dialog submission
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A platform read failed
    #[error("failed to get {entity} {id}: {source}")]
    UpstreamLookup {
        entity: &'static str,
        id: String,
        #[source]
        source: PlatformError,
    },

    /// A platform write failed
    #[error("failed to {action} {id}: {source}")]
    UpstreamWrite {
        action: &'static str,
        id: String,
        #[source]
        source: PlatformError,
    },
}

impl RedistributeError {
    pub fn invalid<T: ToString>(msg: T) -> Self {
        Self::InvalidRequest(msg.to_string())
    }

    pub fn lookup(entity: &'static str, id: impl Into<String>, source: PlatformError) -> Self {
        Self::UpstreamLookup {
            entity,
            id: id.into(),
            source,
        }
    }

    pub fn write(action: &'static str, id: impl Into<String>, source: PlatformError) -> Self {
        Self::UpstreamWrite {
            action,
            id: id.into(),
            source,
        }
    }
}

/// A failed redistribution, with the rollback that ran before giving up.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct Failure {
    #[source]
    pub error: RedistributeError,
    /// Set when created posts had to be compensated.
    pub rollback: Option<RollbackReport>,
}

impl Failure {
    pub fn user_message(&self) -> &'static str {
        GENERIC_ERROR_MESSAGE
    }
}

impl From<RedistributeError> for Failure {
    fn from(error: RedistributeError) -> Self {
        Self {
            error,
            rollback: None,
        }
    }
}
