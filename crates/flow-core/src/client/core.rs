//! `FlowClient`: punto de entrada del motor.
//!
//! El cliente es un objeto explícito y clonable (storage, cache y
//! configuración detrás de `Arc`). No hay estado global: varios clientes con
//! configuraciones distintas conviven en el mismo proceso.

use std::future::Future;
use std::sync::Arc;

use log::{debug, info};

use super::builder::ClientBuilder;
use super::config::FlowConfig;
use super::instance::FlowInstance;
use crate::cache::FlowCache;
use crate::errors::{FlowError, FlowErrorKind, StorageError};
use crate::model::{normalize_identifier, Flow, FlowStatus};
use crate::storage::FlowStorage;

#[derive(Clone)]
pub struct FlowClient {
    pub(crate) config: Arc<FlowConfig>,
    pub(crate) storage: Arc<dyn FlowStorage>,
    pub(crate) cache: Arc<FlowCache>,
}

impl std::fmt::Debug for FlowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowClient")
         .field("config", &self.config)
         .field("cache", &self.cache)
         .finish_non_exhaustive()
    }
}

impl FlowClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Crea el cliente y aplica el esquema (una vez, omitido en producción).
    pub async fn new(storage: Arc<dyn FlowStorage>, config: FlowConfig) -> Result<Self, FlowError> {
        let cache = FlowCache::new(config.cache_enabled, config.max_cache_size);
        let client = Self { config: Arc::new(config),
                            storage,
                            cache: Arc::new(cache) };
        if !client.config.production {
            client.guarded("apply_schema", "", client.storage.apply_schema()).await?;
        }
        Ok(client)
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn cache(&self) -> &FlowCache {
        &self.cache
    }

    /// Vacía la cache. El storage lo libera su dueño al soltar el `Arc`.
    pub fn close(&self) {
        self.cache.clear();
        info!("flow client closed service={}", self.config.service_name);
    }

    /// Inicia una ejecución de `name`.
    ///
    /// - producción: instancia `Skipped`, sin tocar el storage.
    /// - límite configurado y alcanzado: instancia `SkippedLimit`, sin escribir.
    /// - en otro caso: interrumpe el flow ACTIVE de la misma clave e inserta
    ///   uno nuevo en una sola unidad atómica; actualiza la cache.
    pub async fn start(&self, name: &str, identifier: Option<&str>) -> Result<FlowInstance, FlowError> {
        const OP: &str = "start";
        let identifier = normalize_identifier(identifier);
        if self.config.production {
            debug!("production mode: skipping flow '{name}'");
            return Ok(self.unpersisted(name, identifier, FlowStatus::Skipped));
        }

        if self.config.limit_enabled() {
            let count = self.guarded(OP, name, self.storage.count_flows_by_name(name)).await?;
            if self.config.limit_reached(count) {
                info!("limit reached for flow '{name}' ({count}/{})", self.config.max_executions);
                return Ok(self.unpersisted(name, identifier, FlowStatus::SkippedLimit));
            }
        }

        let (flow, interrupted) = self.guarded(OP,
                                               name,
                                               self.storage
                                                   .replace_active_flow(name, identifier, &self.config.service_name))
                                      .await?;
        if interrupted > 0 {
            debug!("interrupted {interrupted} active flow(s) for '{name}'");
        }
        self.cache.delete(name, identifier);
        self.cache.set(name, identifier, flow.clone());
        info!("flow started: '{name}' (id={})", flow.id);
        Ok(FlowInstance::new(self.clone(), flow))
    }

    /// Recupera el flow ACTIVE más reciente de la clave.
    ///
    /// La cache se consulta primero; un acierto no toca el storage. Si no hay
    /// flow activo y el límite de ejecuciones ya se alcanzó, devuelve una
    /// instancia `SkippedLimit` en lugar de `NotFound`.
    pub async fn get_flow(&self, name: &str, identifier: Option<&str>) -> Result<FlowInstance, FlowError> {
        const OP: &str = "get_flow";
        let identifier = normalize_identifier(identifier);
        if self.config.production {
            return Ok(self.unpersisted(name, identifier, FlowStatus::Skipped));
        }

        if let Some(cached) = self.cache.get(name, identifier) {
            debug!("cache hit for flow '{name}'");
            return Ok(FlowInstance::new(self.clone(), cached));
        }

        let found = self.deadline(OP, name, self.storage.find_active_flow(name, identifier)).await?;
        let flow = match found {
            Ok(flow) => flow,
            Err(StorageError::NotFound) if self.config.limit_enabled() => {
                let count = self.guarded(OP, name, self.storage.count_flows_by_name(name)).await?;
                if self.config.limit_reached(count) {
                    info!("flow '{name}' reached execution limit ({count}/{}), skipping",
                          self.config.max_executions);
                    return Ok(self.unpersisted(name, identifier, FlowStatus::SkippedLimit));
                }
                return Err(FlowError::new(OP, name, FlowErrorKind::NotFound));
            }
            Err(e) => return Err(FlowError::storage(OP, name, e)),
        };

        self.cache.set(name, identifier, flow.clone());
        Ok(FlowInstance::new(self.clone(), flow))
    }

    fn unpersisted(&self, name: &str, identifier: Option<&str>, status: FlowStatus) -> FlowInstance {
        FlowInstance::new(self.clone(), Flow::unpersisted(name, identifier, status))
    }

    /// Aplica el plazo configurado sin interpretar el resultado interno.
    /// Un timeout de cero desactiva el plazo.
    pub(crate) async fn deadline<T, F>(&self, op: &'static str, flow_name: &str, fut: F) -> Result<T, FlowError>
        where F: Future<Output = T>
    {
        if self.config.timeout.is_zero() {
            return Ok(fut.await);
        }
        tokio::time::timeout(self.config.timeout, fut).await
                                                      .map_err(|_| {
                                                          FlowError::new(op,
                                                                         flow_name,
                                                                         FlowErrorKind::Timeout(self.config.timeout))
                                                      })
    }

    /// Plazo + envoltura de errores de storage con operación y flow.
    pub(crate) async fn guarded<T, F>(&self, op: &'static str, flow_name: &str, fut: F) -> Result<T, FlowError>
        where F: Future<Output = Result<T, StorageError>>
    {
        self.deadline(op, flow_name, fut)
            .await?
            .map_err(|e| FlowError::storage(op, flow_name, e))
    }
}
