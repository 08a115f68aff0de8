//! Errores del motor.
//!
//! `FlowError` envuelve siempre una causa (`FlowErrorKind`) junto con la
//! operación y el nombre del flow que la originaron. Los estados
//! `Skipped`/`SkippedLimit` no son errores: se señalan en la instancia
//! devuelta. Las variantes homónimas existen para quien quiera convertirlos
//! en fallo (ver `FlowInstance::require_tracked`).

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Error reportado por una implementación de `FlowStorage`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl StorageError {
    pub fn backend<E>(err: E) -> Self
        where E: Into<Box<dyn std::error::Error + Send + Sync>>
    {
        StorageError::Backend(err.into())
    }
}

/// Causa de un `FlowError`.
#[derive(Debug, Error)]
pub enum FlowErrorKind {
    #[error("no active flow matches")]
    NotFound,
    #[error("skipped (production mode)")]
    Skipped,
    #[error("execution limit reached")]
    LimitReached,
    #[error("storage failure: {0}")]
    Storage(#[source] StorageError),
    #[error("could not serialize value: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("deadline exceeded after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[derive(Debug)]
pub struct FlowError {
    pub op: &'static str,
    pub flow_name: String,
    pub kind: FlowErrorKind,
}

impl FlowError {
    pub fn new(op: &'static str, flow_name: impl Into<String>, kind: FlowErrorKind) -> Self {
        Self { op,
               flow_name: flow_name.into(),
               kind }
    }

    /// Errores de storage: `NotFound` se eleva a `FlowErrorKind::NotFound`.
    pub fn storage(op: &'static str, flow_name: impl Into<String>, err: StorageError) -> Self {
        let kind = match err {
            StorageError::NotFound => FlowErrorKind::NotFound,
            other => FlowErrorKind::Storage(other),
        };
        Self::new(op, flow_name, kind)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new("build", "", FlowErrorKind::Config(msg.into()))
    }

    pub fn kind(&self) -> &FlowErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> FlowErrorKind {
        self.kind
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, FlowErrorKind::NotFound)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.kind, FlowErrorKind::Skipped)
    }

    pub fn is_limit_reached(&self) -> bool {
        matches!(self.kind, FlowErrorKind::LimitReached)
    }

    pub fn is_storage(&self) -> bool {
        matches!(self.kind, FlowErrorKind::Storage(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, FlowErrorKind::Timeout(_))
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.flow_name.is_empty() {
            write!(f, "flow.{}: {}", self.op, self.kind)
        } else {
            write!(f, "flow.{} [{}]: {}", self.op, self.flow_name, self.kind)
        }
    }
}

impl std::error::Error for FlowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
