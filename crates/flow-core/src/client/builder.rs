//! Builder fluido para `FlowClient`.

use std::sync::Arc;
use std::time::Duration;

use super::config::{FlowConfig, PoolConfig};
use super::core::FlowClient;
use crate::errors::FlowError;
use crate::storage::FlowStorage;

#[derive(Default)]
pub struct ClientBuilder {
    config: FlowConfig,
    storage: Option<Arc<dyn FlowStorage>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reemplaza la configuración completa (los `with_*` posteriores la
    /// modifican).
    pub fn with_config(mut self, config: FlowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn FlowStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.config.service_name = service_name.into();
        self
    }

    pub fn with_production_mode(mut self, production: bool) -> Self {
        self.config.production = production;
        self
    }

    pub fn with_max_executions(mut self, max: u32) -> Self {
        self.config.max_executions = max;
        self
    }

    pub fn with_caching(mut self, enabled: bool, max_size: usize) -> Self {
        self.config.cache_enabled = enabled;
        self.config.max_cache_size = max_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_connection_pool(mut self, max_idle: u32, max_open: u32, max_lifetime: Option<Duration>) -> Self {
        self.config.pool = PoolConfig { max_idle,
                                        max_open,
                                        max_lifetime };
        self
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub async fn build(self) -> Result<FlowClient, FlowError> {
        let storage = self.storage
                          .ok_or_else(|| FlowError::config("storage backend is required"))?;
        FlowClient::new(storage, self.config).await
    }
}
