use std::sync::Arc;

use crate::application::ports::node_repository::NodeRepository;
use crate::application::ports::settings_repository::SettingsRepository;
use crate::application::services::node_tree::NodeTreeManager;
use crate::bootstrap::config::Config;
use crate::infrastructure::db::PgPool;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

pub struct AppServices {
    node_tree: NodeTreeManager,
    settings_repo: Arc<dyn SettingsRepository>,
    // None for the in-memory backend
    pool: Option<PgPool>,
}

impl AppServices {
    pub fn new(
        node_repo: Arc<dyn NodeRepository>,
        settings_repo: Arc<dyn SettingsRepository>,
        pool: Option<PgPool>,
    ) -> Self {
        Self {
            node_tree: NodeTreeManager::new(node_repo),
            settings_repo,
            pool,
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn node_tree(&self) -> &NodeTreeManager {
        &self.services.node_tree
    }

    pub fn settings_repo(&self) -> Arc<dyn SettingsRepository> {
        self.services.settings_repo.clone()
    }

    pub fn pool(&self) -> Option<&PgPool> {
        self.services.pool.as_ref()
    }
}
