use std::sync::Arc;

use sharepost_core::PluginConfig;
use sharepost_db::Database;
use sharepost_gateway::Dispatcher;

use crate::platform::LocalPlatform;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub dispatcher: Dispatcher,
    /// Captured once at activation.
    pub config: PluginConfig,
    /// Version the local platform reports to the activation check.
    pub platform_version: String,
}

impl AppStateInner {
    pub fn platform(&self) -> LocalPlatform<'_> {
        LocalPlatform::new(
            &self.db,
            &self.dispatcher,
            Some(self.config.site_url()),
            &self.platform_version,
        )
    }
}
