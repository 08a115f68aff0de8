//! Filas Diesel de `flows`, `points` y `assertions` y su mapeo al modelo del
//! core.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use flow_core::{Assertion, Flow, FlowStatus, Point};
use serde_json::Value;

use crate::error::PersistenceError;
use crate::schema::{assertions, flows, points};

/// Fila de `flows` en el orden de columnas de la tabla.
#[derive(Queryable, Debug)]
pub struct FlowRow {
    pub id: i64,
    pub name: String,
    pub identifier: Option<String>,
    pub status: String,
    pub service: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<FlowRow> for Flow {
    type Error = PersistenceError;

    fn try_from(row: FlowRow) -> Result<Self, Self::Error> {
        let status: FlowStatus = row.status
                                    .parse()
                                    .map_err(|e| PersistenceError::Unknown(format!("flow {}: {e}", row.id)))?;
        Ok(Flow { id: row.id,
                  name: row.name,
                  identifier: row.identifier,
                  status,
                  service: row.service,
                  metadata: row.metadata,
                  created_at: row.created_at,
                  updated_at: row.updated_at })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = flows)]
pub struct NewFlowRow<'a> {
    pub name: &'a str,
    pub identifier: Option<&'a str>,
    pub status: &'a str,
    pub service: Option<&'a str>,
}

#[derive(Queryable, Debug)]
pub struct PointRow {
    pub id: i64,
    pub flow_id: i64,
    pub description: String,
    pub expected: Value,
    pub service_name: Option<String>,
    pub validation_schema: Option<Value>,
    pub timeout_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<PointRow> for Point {
    fn from(row: PointRow) -> Self {
        Point { id: row.id,
                flow_id: row.flow_id,
                description: row.description,
                expected: row.expected,
                service_name: row.service_name,
                schema: row.validation_schema,
                timeout_ms: row.timeout_ms,
                created_at: row.created_at }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = points)]
pub struct NewPointRow<'a> {
    pub flow_id: i64,
    pub description: &'a str,
    pub expected: &'a Value,
    pub service_name: Option<&'a str>,
    pub validation_schema: Option<&'a Value>,
    pub timeout_ms: Option<i64>,
}

#[derive(Queryable, Debug)]
pub struct AssertionRow {
    pub id: i64,
    pub flow_id: i64,
    pub actual: Value,
    pub service_name: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<AssertionRow> for Assertion {
    fn from(row: AssertionRow) -> Self {
        Assertion { id: row.id,
                    flow_id: row.flow_id,
                    actual: row.actual,
                    service_name: row.service_name,
                    processed_at: row.processed_at,
                    created_at: row.created_at }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = assertions)]
pub struct NewAssertionRow<'a> {
    pub flow_id: i64,
    pub actual: &'a Value,
    pub service_name: Option<&'a str>,
    pub processed_at: Option<DateTime<Utc>>,
}
