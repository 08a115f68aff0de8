//! Puntos (expectativas) y aserciones (observaciones). Ambos son inmutables
//! una vez escritos.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Expectativa registrada por el lado productor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: i64,
    pub flow_id: i64,
    pub description: String,
    pub expected: Value,
    pub service_name: Option<String>,
    pub schema: Option<Value>,
    pub timeout_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Punto pendiente de inserción.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPoint {
    pub flow_id: i64,
    pub description: String,
    pub expected: Value,
    pub service_name: String,
    pub schema: Option<Value>,
    pub timeout: Option<Duration>,
}

impl NewPoint {
    /// Timeout en milisegundos tal como se guarda en `points.timeout_ms`.
    pub fn timeout_ms(&self) -> Option<i64> {
        self.timeout.map(|t| i64::try_from(t.as_millis()).unwrap_or(i64::MAX))
    }
}

/// Opciones de creación de un punto. Se almacenan tal cual; validar el
/// esquema o hacer cumplir el timeout es tarea de un validador externo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointOptions {
    pub schema: Option<Value>,
    pub timeout: Option<Duration>,
}

impl PointOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Observación registrada por el lado consumidor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub id: i64,
    pub flow_id: i64,
    pub actual: Value,
    pub service_name: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn point_options_builder() {
        let opts = PointOptions::new().with_schema(json!({"type": "object"}))
                                      .with_timeout(Duration::from_secs(5));
        assert_eq!(opts.schema, Some(json!({"type": "object"})));
        assert_eq!(opts.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn timeout_is_stored_in_millis() {
        let p = NewPoint { flow_id: 1,
                           description: "d".into(),
                           expected: json!(null),
                           service_name: "svc".into(),
                           schema: None,
                           timeout: Some(Duration::from_millis(1500)) };
        assert_eq!(p.timeout_ms(), Some(1500));
    }
}
