//! flowtrack
//!
//! Detección de drift de contratos entre servicios: un servicio declara lo
//! que espera en cada paso de un proceso y otro registra lo que observa; al
//! cerrar el flow se reconcilian ambos lados.
//!
//! - `flow_core`: comparador, cache, modelo y ciclo de vida (re-exportado).
//! - `flow_persistence`: backend Postgres.
//! - `config`: `AppConfig` desde el entorno.
//! - `demo`: escenario "Order Processing" del binario `flowtrack`.

pub mod config;
pub mod demo;
pub mod errors;

use std::sync::Arc;

pub use flow_core::*;
pub use flow_persistence;

use config::AppConfig;
use errors::AppError;
use flow_persistence::PgFlowStorage;

/// Construye un cliente sobre Postgres a partir de `AppConfig`.
///
/// El pool se arma en un hilo bloqueante (r2d2 abre conexiones al
/// construirse) con `statement_timeout` igual al timeout del cliente.
pub async fn connect(cfg: &AppConfig) -> Result<FlowClient, AppError> {
    let mut db = cfg.database.clone();
    db.pool = cfg.flow.pool.clone();
    let timeout = Some(cfg.flow.timeout);
    let storage = tokio::task::spawn_blocking(move || PgFlowStorage::connect(&db, timeout))
        .await
        .map_err(|e| AppError::Internal(format!("pool task failed: {e}")))??;
    Ok(FlowClient::new(Arc::new(storage), cfg.flow.clone()).await?)
}
