//! Abstracción de almacenamiento durable.
//!
//! `FlowStorage` es el único punto que toca la base de datos. La
//! implementación de producción vive en `flow-persistence` (Postgres);
//! `InMemoryFlowStorage` cumple el mismo contrato para tests y para procesos
//! sin base de datos.
//!
//! Contrato común:
//! - `identifier = None` se guarda como NULL y sólo coincide con NULL.
//! - Los puntos y aserciones se devuelven en orden de inserción (`id`
//!   ascendente), nunca por reloj.
//! - Ningún método reintenta: la política de reintentos es del llamador.

mod memory;

pub use memory::InMemoryFlowStorage;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StorageError;
use crate::model::{Assertion, Flow, NewPoint, Point};

#[async_trait]
pub trait FlowStorage: Send + Sync {
    /// Crea tablas e índices si no existen. Idempotente.
    async fn apply_schema(&self) -> Result<(), StorageError>;

    /// Total histórico de flows con ese nombre, sin importar el estado.
    async fn count_flows_by_name(&self, name: &str) -> Result<u64, StorageError>;

    /// Marca como INTERRUPTED el flow ACTIVE de la clave. Devuelve cuántas
    /// filas cambiaron (0 no es error).
    async fn interrupt_active_flows(&self, name: &str, identifier: Option<&str>) -> Result<u64, StorageError>;

    /// Inserta un flow nuevo en estado ACTIVE.
    async fn insert_flow(&self, name: &str, identifier: Option<&str>, service: &str) -> Result<Flow, StorageError>;

    /// `interrupt_active_flows` + `insert_flow` como una sola unidad atómica.
    /// Devuelve el flow nuevo y cuántos flows fueron interrumpidos.
    async fn replace_active_flow(&self,
                                 name: &str,
                                 identifier: Option<&str>,
                                 service: &str)
                                 -> Result<(Flow, u64), StorageError>;

    /// Flow ACTIVE más reciente de la clave; `StorageError::NotFound` si no hay.
    async fn find_active_flow(&self, name: &str, identifier: Option<&str>) -> Result<Flow, StorageError>;

    async fn finish_flow(&self, flow_id: i64) -> Result<(), StorageError>;

    async fn insert_point(&self, point: &NewPoint) -> Result<i64, StorageError>;

    /// Inserta una aserción sellando `processed_at` con la hora actual.
    async fn insert_assertion(&self, flow_id: i64, actual: &Value, service: &str) -> Result<i64, StorageError>;

    async fn fetch_points(&self, flow_id: i64) -> Result<Vec<Point>, StorageError>;

    async fn fetch_assertions(&self, flow_id: i64) -> Result<Vec<Assertion>, StorageError>;

    /// Fan-out/fan-in: ambas lecturas corren concurrentemente y se esperan
    /// juntas. El primer error gana y descarta el resultado del otro tramo.
    async fn fetch_points_and_assertions(&self, flow_id: i64) -> Result<(Vec<Point>, Vec<Assertion>), StorageError> {
        tokio::try_join!(self.fetch_points(flow_id), self.fetch_assertions(flow_id))
    }
}
