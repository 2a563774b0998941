use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AgentService, SeaOrmAgentService, SeaOrmUserAdminService, UserAdminService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub user_service: Arc<dyn UserAdminService>,

    pub agent_service: Arc<dyn AgentService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let security = config.security.clone();
        let config_arc = Arc::new(RwLock::new(config));

        let user_service = Arc::new(SeaOrmUserAdminService::new(store.clone(), security))
            as Arc<dyn UserAdminService + Send + Sync + 'static>;

        let agent_service = Arc::new(SeaOrmAgentService::new(store.clone()))
            as Arc<dyn AgentService + Send + Sync + 'static>;

        Ok(Self {
            config: config_arc,
            store,
            user_service,
            agent_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
