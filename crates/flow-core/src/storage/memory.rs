use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use super::FlowStorage;
use crate::errors::StorageError;
use crate::model::{Assertion, Flow, FlowStatus, NewPoint, Point};

#[derive(Debug, Default)]
struct Tables {
    flows: Vec<Flow>,
    points: Vec<Point>,
    assertions: Vec<Assertion>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn interrupt(&mut self, name: &str, identifier: Option<&str>) -> u64 {
        let now = Utc::now();
        let mut changed = 0;
        for f in self.flows
                     .iter_mut()
                     .filter(|f| f.name == name && f.identifier.as_deref() == identifier && f.status == FlowStatus::Active)
        {
            f.status = FlowStatus::Interrupted;
            f.updated_at = now;
            changed += 1;
        }
        changed
    }

    fn insert_flow(&mut self, name: &str, identifier: Option<&str>, service: &str) -> Flow {
        let now = Utc::now();
        let flow = Flow { id: self.next_id(),
                          name: name.to_string(),
                          identifier: identifier.map(str::to_string),
                          status: FlowStatus::Active,
                          service: Some(service.to_string()),
                          metadata: None,
                          created_at: now,
                          updated_at: now };
        self.flows.push(flow.clone());
        flow
    }
}

/// Storage en memoria (tablas guardadas por un `Mutex`). Los ids son
/// monotónicos y compartidos entre tablas, como un BIGSERIAL por proceso.
#[derive(Debug, Default)]
pub struct InMemoryFlowStorage {
    inner: Mutex<Tables>,
}

impl InMemoryFlowStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copia de todos los flows (inspección en tests).
    pub fn flows(&self) -> Vec<Flow> {
        self.lock().flows.clone()
    }

    /// Flows de una clave con un estado dado.
    pub fn count_with_status(&self, name: &str, identifier: Option<&str>, status: FlowStatus) -> usize {
        self.lock()
            .flows
            .iter()
            .filter(|f| f.name == name && f.identifier.as_deref() == identifier && f.status == status)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl FlowStorage for InMemoryFlowStorage {
    async fn apply_schema(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn count_flows_by_name(&self, name: &str) -> Result<u64, StorageError> {
        Ok(self.lock().flows.iter().filter(|f| f.name == name).count() as u64)
    }

    async fn interrupt_active_flows(&self, name: &str, identifier: Option<&str>) -> Result<u64, StorageError> {
        Ok(self.lock().interrupt(name, identifier))
    }

    async fn insert_flow(&self, name: &str, identifier: Option<&str>, service: &str) -> Result<Flow, StorageError> {
        Ok(self.lock().insert_flow(name, identifier, service))
    }

    async fn replace_active_flow(&self,
                                 name: &str,
                                 identifier: Option<&str>,
                                 service: &str)
                                 -> Result<(Flow, u64), StorageError> {
        let mut tables = self.lock();
        let interrupted = tables.interrupt(name, identifier);
        Ok((tables.insert_flow(name, identifier, service), interrupted))
    }

    async fn find_active_flow(&self, name: &str, identifier: Option<&str>) -> Result<Flow, StorageError> {
        self.lock()
            .flows
            .iter()
            .filter(|f| f.name == name && f.identifier.as_deref() == identifier && f.status == FlowStatus::Active)
            .max_by_key(|f| f.id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn finish_flow(&self, flow_id: i64) -> Result<(), StorageError> {
        let mut tables = self.lock();
        if let Some(f) = tables.flows.iter_mut().find(|f| f.id == flow_id) {
            f.status = FlowStatus::Finished;
            f.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_point(&self, point: &NewPoint) -> Result<i64, StorageError> {
        let mut tables = self.lock();
        let id = tables.next_id();
        tables.points.push(Point { id,
                                   flow_id: point.flow_id,
                                   description: point.description.clone(),
                                   expected: point.expected.clone(),
                                   service_name: Some(point.service_name.clone()),
                                   schema: point.schema.clone(),
                                   timeout_ms: point.timeout_ms(),
                                   created_at: Utc::now() });
        Ok(id)
    }

    async fn insert_assertion(&self, flow_id: i64, actual: &Value, service: &str) -> Result<i64, StorageError> {
        let mut tables = self.lock();
        let id = tables.next_id();
        let now = Utc::now();
        tables.assertions.push(Assertion { id,
                                           flow_id,
                                           actual: actual.clone(),
                                           service_name: Some(service.to_string()),
                                           processed_at: Some(now),
                                           created_at: now });
        Ok(id)
    }

    async fn fetch_points(&self, flow_id: i64) -> Result<Vec<Point>, StorageError> {
        let mut points: Vec<Point> = self.lock().points.iter().filter(|p| p.flow_id == flow_id).cloned().collect();
        points.sort_by_key(|p| p.id);
        Ok(points)
    }

    async fn fetch_assertions(&self, flow_id: i64) -> Result<Vec<Assertion>, StorageError> {
        let mut assertions: Vec<Assertion> =
            self.lock().assertions.iter().filter(|a| a.flow_id == flow_id).cloned().collect();
        assertions.sort_by_key(|a| a.id);
        Ok(assertions)
    }
}
