#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flow_core::{Assertion, Flow, FlowClient, FlowStorage, InMemoryFlowStorage, NewPoint, Point, StorageError};
use serde_json::Value;
use tokio::sync::Barrier;

/// Envoltura sobre `InMemoryFlowStorage` que cuenta llamadas y permite
/// inyectar fallos o demoras por operación.
#[derive(Default)]
pub struct ProbeStorage {
    pub inner: InMemoryFlowStorage,
    pub calls: AtomicUsize,
    pub find_calls: AtomicUsize,
    pub fail_assertions_fetch: AtomicBool,
    pub fail_points_fetch: AtomicBool,
    pub fail_everything: AtomicBool,
    pub slow_find: AtomicBool,
    /// Si está, `fetch_points` y `fetch_assertions` esperan a encontrarse
    /// antes de leer: sólo avanzan cuando ambas corren a la vez.
    pub fetch_rendezvous: Option<Barrier>,
}

impl ProbeStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_fetch_rendezvous() -> Arc<Self> {
        Arc::new(Self { fetch_rendezvous: Some(Barrier::new(2)),
                        ..Self::default() })
    }

    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_everything.load(Ordering::SeqCst) {
            return Err(StorageError::backend("backend unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl FlowStorage for ProbeStorage {
    async fn apply_schema(&self) -> Result<(), StorageError> {
        self.enter()?;
        self.inner.apply_schema().await
    }

    async fn count_flows_by_name(&self, name: &str) -> Result<u64, StorageError> {
        self.enter()?;
        self.inner.count_flows_by_name(name).await
    }

    async fn interrupt_active_flows(&self, name: &str, identifier: Option<&str>) -> Result<u64, StorageError> {
        self.enter()?;
        self.inner.interrupt_active_flows(name, identifier).await
    }

    async fn insert_flow(&self, name: &str, identifier: Option<&str>, service: &str) -> Result<Flow, StorageError> {
        self.enter()?;
        self.inner.insert_flow(name, identifier, service).await
    }

    async fn replace_active_flow(&self,
                                 name: &str,
                                 identifier: Option<&str>,
                                 service: &str)
                                 -> Result<(Flow, u64), StorageError> {
        self.enter()?;
        self.inner.replace_active_flow(name, identifier, service).await
    }

    async fn find_active_flow(&self, name: &str, identifier: Option<&str>) -> Result<Flow, StorageError> {
        self.enter()?;
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.slow_find.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.inner.find_active_flow(name, identifier).await
    }

    async fn finish_flow(&self, flow_id: i64) -> Result<(), StorageError> {
        self.enter()?;
        self.inner.finish_flow(flow_id).await
    }

    async fn insert_point(&self, point: &NewPoint) -> Result<i64, StorageError> {
        self.enter()?;
        self.inner.insert_point(point).await
    }

    async fn insert_assertion(&self, flow_id: i64, actual: &Value, service: &str) -> Result<i64, StorageError> {
        self.enter()?;
        self.inner.insert_assertion(flow_id, actual, service).await
    }

    async fn fetch_points(&self, flow_id: i64) -> Result<Vec<Point>, StorageError> {
        self.enter()?;
        if self.fail_points_fetch.load(Ordering::SeqCst) {
            return Err(StorageError::backend("points table unavailable"));
        }
        if let Some(b) = &self.fetch_rendezvous {
            b.wait().await;
        }
        self.inner.fetch_points(flow_id).await
    }

    async fn fetch_assertions(&self, flow_id: i64) -> Result<Vec<Assertion>, StorageError> {
        self.enter()?;
        if self.fail_assertions_fetch.load(Ordering::SeqCst) {
            return Err(StorageError::backend("assertions table unavailable"));
        }
        if let Some(b) = &self.fetch_rendezvous {
            b.wait().await;
        }
        self.inner.fetch_assertions(flow_id).await
    }
}

pub async fn client_with(storage: Arc<ProbeStorage>, max_executions: u32, cache: bool) -> FlowClient {
    FlowClient::builder().with_storage(storage)
                         .with_service_name("test-service")
                         .with_max_executions(max_executions)
                         .with_caching(cache, 100)
                         .build()
                         .await
                         .expect("client")
}
