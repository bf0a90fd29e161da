//! Post redistribution engine.
//!
//! [`RedistributionEngine`] shares or moves a post (and its thread) to another
//! channel; [`PermalinkExpander`] rewrites pasted permalinks into quotes before
//! a post is stored. Both talk to the chat platform only through
//! [`ChatPlatform`].

pub mod compensation;
pub mod config;
pub mod error;
pub mod expander;
pub mod hooked;
pub mod memory;
pub mod platform;
pub mod redistribute;
pub mod request;

pub use compensation::{CompensationLog, RollbackReport};
pub use config::{ActivationError, PluginConfig};
pub use error::{Failure, GENERIC_ERROR_MESSAGE, RedistributeError};
pub use expander::{ExpandError, PermalinkExpander};
pub use hooked::HookedPlatform;
pub use memory::MemoryPlatform;
pub use platform::{ChatPlatform, PlatformError};
pub use redistribute::{MoveReport, Outcome, PolicyRejection, RedistributionEngine, ShareReport};
pub use request::{RedistributionRequest, ShareKind};
