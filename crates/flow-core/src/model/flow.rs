//! Ejecución de un proceso con nombre (`Flow`) y su máquina de estados.
//!
//! Sólo `Active`, `Interrupted` y `Finished` llegan a la base de datos.
//! `Skipped` y `SkippedLimit` describen instancias en memoria devueltas cuando
//! la persistencia se omite a propósito (modo producción o límite de
//! ejecuciones alcanzado).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Estado de un flow.
///
/// Transiciones válidas (persistidas):
/// - `Active` -> `Interrupted` (un `start` posterior con la misma clave)
/// - `Active` -> `Finished` (`finish`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStatus {
    Active,
    Interrupted,
    Finished,
    /// Modo producción: instancia inerte, nunca toca el storage.
    Skipped,
    /// Límite de ejecuciones alcanzado: instancia inerte.
    SkippedLimit,
}

impl FlowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::Active => "ACTIVE",
            FlowStatus::Interrupted => "INTERRUPTED",
            FlowStatus::Finished => "FINISHED",
            FlowStatus::Skipped => "SKIPPED",
            FlowStatus::SkippedLimit => "SKIPPED_LIMIT",
        }
    }

    /// `true` para las variantes que nunca se persisten.
    pub fn is_skipped(&self) -> bool {
        matches!(self, FlowStatus::Skipped | FlowStatus::SkippedLimit)
    }
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown flow status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for FlowStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(FlowStatus::Active),
            "INTERRUPTED" => Ok(FlowStatus::Interrupted),
            "FINISHED" => Ok(FlowStatus::Finished),
            "SKIPPED" => Ok(FlowStatus::Skipped),
            "SKIPPED_LIMIT" => Ok(FlowStatus::SkippedLimit),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Una ejecución concreta de un proceso con nombre.
///
/// Campos:
/// - `id`: asignado por el storage al persistir (0 en instancias omitidas).
/// - `identifier`: desambiguador opcional (ej. id de orden); `None` = sin
///   alcance.
/// - `service`: servicio que inició el flow.
/// - `metadata`: JSON opaco, no interpretado por el motor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: i64,
    pub name: String,
    pub identifier: Option<String>,
    pub status: FlowStatus,
    pub service: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flow {
    /// Instancia no persistida con estado `Skipped`/`SkippedLimit`.
    pub fn unpersisted(name: &str, identifier: Option<&str>, status: FlowStatus) -> Self {
        let now = Utc::now();
        Self { id: 0,
               name: name.to_string(),
               identifier: identifier.map(str::to_string),
               status,
               service: None,
               metadata: None,
               created_at: now,
               updated_at: now }
    }

    /// Identificador como `&str`, vacío cuando el flow no tiene alcance.
    pub fn identifier_str(&self) -> &str {
        self.identifier.as_deref().unwrap_or("")
    }
}

/// Normaliza el identificador recibido del llamador: vacío equivale a `None`.
pub fn normalize_identifier(identifier: Option<&str>) -> Option<&str> {
    identifier.filter(|s| !s.is_empty())
}
