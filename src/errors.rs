use flow_core::FlowError;
use flow_persistence::PersistenceError;
use thiserror::Error;

/// Errores de la aplicación (configuración, conexión y motor).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error de persistencia: {0}")]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error("Error interno: {0}")]
    Internal(String),
    #[error("Error serializando salida: {0}")]
    Json(#[from] serde_json::Error),
}
