//! `FlowInstance`: manejador de una ejecución obtenida con `start`/`get_flow`.
//!
//! Las instancias `Skipped`/`SkippedLimit` (y cualquier instancia de un
//! cliente en modo producción) son inertes: todas las operaciones devuelven
//! éxito sin tocar el storage.
//!
//! No se vuelve a verificar el estado persistido: una instancia cuyo flow fue
//! interrumpido por un `start` posterior sigue escribiendo puntos y
//! aserciones con normalidad.

use std::time::{Duration, Instant};

use log::{debug, error, info};
use serde::Serialize;

use super::core::FlowClient;
use super::reconcile::reconcile;
use crate::errors::{FlowError, FlowErrorKind};
use crate::model::{FinishResult, Flow, FlowStatus, NewPoint, PointOptions};

#[derive(Debug)]
pub struct FlowInstance {
    client: FlowClient,
    flow: Flow,
    started_at: Instant,
}

impl FlowInstance {
    pub(crate) fn new(client: FlowClient, flow: Flow) -> Self {
        Self { client,
               flow,
               started_at: Instant::now() }
    }

    pub fn flow_info(&self) -> &Flow {
        &self.flow
    }

    pub fn status(&self) -> FlowStatus {
        self.flow.status
    }

    pub fn is_skipped(&self) -> bool {
        self.flow.status.is_skipped()
    }

    /// Tiempo transcurrido desde que se obtuvo la instancia.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Convierte las instancias omitidas en error para quien no quiera
    /// tratarlas como éxito silencioso.
    pub fn require_tracked(&self) -> Result<(), FlowError> {
        match self.flow.status {
            FlowStatus::Skipped => Err(FlowError::new("require_tracked", &self.flow.name, FlowErrorKind::Skipped)),
            FlowStatus::SkippedLimit => {
                Err(FlowError::new("require_tracked", &self.flow.name, FlowErrorKind::LimitReached))
            }
            _ => Ok(()),
        }
    }

    fn inert(&self) -> bool {
        self.client.config.production || self.is_skipped()
    }

    /// Registra una expectativa. `expected` se serializa a JSON.
    pub async fn create_point<T>(&self, description: &str, expected: &T, options: PointOptions) -> Result<(), FlowError>
        where T: Serialize + ?Sized
    {
        const OP: &str = "create_point";
        if self.inert() {
            return Ok(());
        }
        let expected = serde_json::to_value(expected).map_err(|e| {
                                                         FlowError::new(OP,
                                                                        &self.flow.name,
                                                                        FlowErrorKind::Serialization(e))
                                                     })?;
        let point = NewPoint { flow_id: self.flow.id,
                               description: description.to_string(),
                               expected,
                               service_name: self.client.config.service_name.clone(),
                               schema: options.schema,
                               timeout: options.timeout };
        let id = self.client
                     .guarded(OP, &self.flow.name, self.client.storage.insert_point(&point))
                     .await?;
        debug!("point created: '{description}' (id={id}) on flow '{}'", self.flow.name);
        Ok(())
    }

    /// Registra una observación. `actual` se serializa a JSON.
    pub async fn add_assertion<T>(&self, actual: &T) -> Result<(), FlowError>
        where T: Serialize + ?Sized
    {
        const OP: &str = "add_assertion";
        if self.inert() {
            return Ok(());
        }
        let actual = serde_json::to_value(actual).map_err(|e| {
                                                     FlowError::new(OP, &self.flow.name, FlowErrorKind::Serialization(e))
                                                 })?;
        let id = self.client
                     .guarded(OP,
                              &self.flow.name,
                              self.client
                                  .storage
                                  .insert_assertion(self.flow.id, &actual, &self.client.config.service_name))
                     .await?;
        debug!("assertion added (id={id}) to flow '{}'", self.flow.name);
        Ok(())
    }

    /// Persiste FINISHED, invalida la cache y reconcilia.
    ///
    /// Las diferencias de contenido nunca hacen fallar esta llamada: se
    /// devuelven como discrepancias. Sólo los fallos de infraestructura
    /// (escritura o lectura) producen `Err`.
    pub async fn finish(&mut self) -> Result<FinishResult, FlowError> {
        const OP: &str = "finish";
        if self.inert() {
            return Ok(FinishResult::skipped());
        }
        let name = self.flow.name.clone();
        self.client
            .guarded(OP, &name, self.client.storage.finish_flow(self.flow.id))
            .await?;
        self.flow.status = FlowStatus::Finished;
        self.client.cache.delete(&name, self.flow.identifier.as_deref());

        let (points, assertions) = self.client
                                       .guarded(OP, &name, self.client.storage.fetch_points_and_assertions(self.flow.id))
                                       .await?;
        let result = reconcile(&points, &assertions, self.started_at.elapsed());
        if result.success {
            info!("flow '{name}' finished: SUCCESS ({:?})", result.execution_time);
        } else {
            error!("flow '{name}' finished: FAILED with {} discrepancies ({:?})",
                   result.error_count,
                   result.execution_time);
        }
        Ok(result)
    }
}
