//! Resultado de `finish`: discrepancias encontradas al reconciliar.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::compare::DiffEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    /// El par punto/aserción difiere estructuralmente.
    ValueMismatch,
    /// Hay más puntos que aserciones.
    MissingAssertion,
    /// Hay más aserciones que puntos.
    OrphanAssertion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_id: Option<i64>,
    pub description: String,
    pub expected: Option<Value>,
    pub actual: Option<Value>,
    /// Mensajes de `entries` unidos con `"; "`.
    pub diff: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<DiffEntry>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub discrepancies: Vec<Discrepancy>,
    pub error_count: usize,
    pub execution_time: Duration,
}

impl FinishResult {
    /// Resultado de un flow omitido: éxito sin trabajo.
    pub fn skipped() -> Self {
        Self { success: true,
               discrepancies: Vec::new(),
               error_count: 0,
               execution_time: Duration::ZERO }
    }
}
