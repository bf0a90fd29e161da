use tracing::{info, warn};

use crate::platform::{ChatPlatform, PlatformError};

/// Ids of posts created during one move, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompensationLog {
    created: Vec<String>,
}

/// What a rollback actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    /// Every id the rollback targeted.
    pub targeted: Vec<String>,
    pub deleted: Vec<String>,
    /// Deletes that failed. Logged, never retried.
    pub failed: Vec<(String, PlatformError)>,
}

impl RollbackReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl CompensationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, post_id: impl Into<String>) {
        self.created.push(post_id.into());
    }

    pub fn len(&self) -> usize {
        self.created.len()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    /// Best-effort delete of every recorded post. A failed delete does not stop
    /// the others.
    pub fn rollback<P: ChatPlatform + ?Sized>(self, platform: &P) -> RollbackReport {
        let mut report = RollbackReport {
            targeted: self.created.clone(),
            ..Default::default()
        };

        for id in self.created {
            match platform.delete_post(&id) {
                Ok(()) => report.deleted.push(id),
                Err(e) => {
                    warn!("Failed to delete post {} during rollback: {}", id, e);
                    report.failed.push((id, e));
                }
            }
        }

        info!(
            "Rollback finished: {} of {} posts deleted",
            report.deleted.len(),
            report.targeted.len()
        );
        report
    }
}
