//! Comparador estructural de valores JSON.
//!
//! `deep_compare(expected, actual)` recorre ambos árboles y devuelve una lista
//! ordenada de `DiffEntry`, cada una con la ruta desde la raíz (`$`, `$.a`,
//! `$.items[2]`). Lista vacía = igualdad estructural.
//!
//! Reglas (recursivas):
//! 1. ambos null -> iguales.
//! 2. sólo uno null -> una entrada en la ruta actual.
//! 3. tipos distintos -> una entrada "type mismatch", no se desciende.
//! 4. objetos -> por cada clave de `expected` se compara o se reporta
//!    "key missing in actual"; las claves sólo presentes en `actual` producen
//!    "unexpected extra key". Las diferencias se acumulan entre hermanos.
//! 5. arreglos -> longitudes distintas producen una sola entrada; si
//!    coinciden se compara índice a índice.
//! 6. escalares -> "value mismatch" si no son iguales.
//!
//! Todos los números son un mismo tipo: `1` y `1.0` son iguales.

mod validation;

pub use validation::{StructuralValidator, Validator};

use serde::Serialize;
use serde_json::{Number, Value};

/// Una diferencia puntual entre esperado y observado.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    pub path: String,
    pub expected: Value,
    pub actual: Value,
    pub message: String,
}

/// Compara `expected` contra `actual` y devuelve las diferencias encontradas.
pub fn deep_compare(expected: &Value, actual: &Value) -> Vec<DiffEntry> {
    let mut diffs = Vec::new();
    collect_diffs(expected, actual, "$", &mut diffs);
    diffs
}

/// Une los mensajes con `"; "`.
pub fn format_diffs(diffs: &[DiffEntry]) -> String {
    diffs.iter().map(|d| d.message.as_str()).collect::<Vec<_>>().join("; ")
}

/// Variante de conveniencia: diff formateado y bandera de igualdad.
pub fn deep_compare_str(expected: &Value, actual: &Value) -> (String, bool) {
    let diffs = deep_compare(expected, actual);
    (format_diffs(&diffs), diffs.is_empty())
}

/// Nombre del tipo JSON para mensajes.
pub fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn collect_diffs(expected: &Value, actual: &Value, path: &str, diffs: &mut Vec<DiffEntry>) {
    match (expected, actual) {
        (Value::Null, Value::Null) => {}
        (Value::Null, _) | (_, Value::Null) => {
            diffs.push(entry(path, expected, actual, format!("path {path}: expected {expected}, got {actual}")));
        }
        (Value::Object(exp), Value::Object(act)) => {
            for (key, exp_val) in exp {
                let child = format!("{path}.{key}");
                match act.get(key) {
                    Some(act_val) => collect_diffs(exp_val, act_val, &child, diffs),
                    None => {
                        let message = format!("path {child}: key missing in actual");
                        diffs.push(entry(&child, exp_val, &Value::Null, message));
                    }
                }
            }
            for (key, act_val) in act {
                if !exp.contains_key(key) {
                    let child = format!("{path}.{key}");
                    let message = format!("path {child}: unexpected extra key in actual");
                    diffs.push(entry(&child, &Value::Null, act_val, message));
                }
            }
        }
        (Value::Array(exp), Value::Array(act)) => {
            if exp.len() != act.len() {
                let message = format!("path {path}: array length mismatch {} != {}", exp.len(), act.len());
                diffs.push(DiffEntry { path: path.to_string(),
                                       expected: Value::from(exp.len()),
                                       actual: Value::from(act.len()),
                                       message });
                return;
            }
            for (i, (e, a)) in exp.iter().zip(act).enumerate() {
                collect_diffs(e, a, &format!("{path}[{i}]"), diffs);
            }
        }
        (Value::Number(e), Value::Number(a)) => {
            if !numbers_equal(e, a) {
                diffs.push(value_mismatch(path, expected, actual));
            }
        }
        _ if type_name(expected) != type_name(actual) => {
            let message = format!("path {path}: type mismatch expected {}, got {}",
                                  type_name(expected),
                                  type_name(actual));
            diffs.push(entry(path, expected, actual, message));
        }
        _ => {
            if expected != actual {
                diffs.push(value_mismatch(path, expected, actual));
            }
        }
    }
}

// Enteros se comparan exactos; si alguno es flotante, por valor f64.
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn value_mismatch(path: &str, expected: &Value, actual: &Value) -> DiffEntry {
    entry(path,
          expected,
          actual,
          format!("path {path}: value mismatch expected {expected}, got {actual}"))
}

fn entry(path: &str, expected: &Value, actual: &Value, message: String) -> DiffEntry {
    DiffEntry { path: path.to_string(),
                expected: expected.clone(),
                actual: actual.clone(),
                message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_values_produce_no_diffs() {
        let samples = [json!(null),
                       json!(true),
                       json!(42),
                       json!(1.5),
                       json!("hello"),
                       json!([1, "two", {"three": 3}]),
                       json!({"a": {"b": [1, 2, {"c": null}]}, "d": "x"})];
        for v in samples {
            assert!(deep_compare(&v, &v).is_empty(), "{v} should equal itself");
        }
    }

    #[test]
    fn primitive_mismatches() {
        let d = deep_compare(&json!("hello"), &json!(42));
        assert_eq!(d.len(), 1);
        assert!(d[0].message.contains("type mismatch expected string, got number"));

        let d = deep_compare(&json!(42), &json!(43));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].message, "path $: value mismatch expected 42, got 43");
    }

    #[test]
    fn integer_and_float_are_the_same_number() {
        assert!(deep_compare(&json!(1), &json!(1.0)).is_empty());
        assert_eq!(deep_compare(&json!(1), &json!(1.5)).len(), 1);
    }

    #[test]
    fn one_sided_null() {
        let d = deep_compare(&json!({"a": null}), &json!({"a": 1}));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].path, "$.a");
        assert_eq!(d[0].message, "path $.a: expected null, got 1");
    }

    #[test]
    fn missing_key_in_actual() {
        let d = deep_compare(&json!({"a": 1, "b": "test"}), &json!({"a": 1}));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].path, "$.b");
        assert!(d[0].message.contains("key missing in actual"));
        assert_eq!(d[0].actual, Value::Null);
    }

    #[test]
    fn extra_key_in_actual() {
        let d = deep_compare(&json!({"a": 1}), &json!({"a": 1, "b": "extra"}));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].path, "$.b");
        assert!(d[0].message.contains("unexpected extra key"));
        assert_eq!(d[0].actual, json!("extra"));
    }

    #[test]
    fn sibling_diffs_accumulate_in_key_order() {
        let d = deep_compare(&json!({"a": 1, "b": 2, "c": 3}), &json!({"a": 9, "b": 2, "c": 8, "z": 0}));
        let paths: Vec<&str> = d.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["$.a", "$.c", "$.z"]);
    }

    #[test]
    fn array_length_mismatch_reports_once() {
        let d = deep_compare(&json!([1, 2, 3]), &json!(["x"]));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].path, "$");
        assert_eq!(d[0].expected, json!(3));
        assert_eq!(d[0].actual, json!(1));
        assert_eq!(d[0].message, "path $: array length mismatch 3 != 1");
    }

    #[test]
    fn nested_paths_use_dots_and_brackets() {
        let expected = json!({"order": {"items": [{"sku": "A"}, {"sku": "B"}]}});
        let actual = json!({"order": {"items": [{"sku": "A"}, {"sku": "C"}]}});
        let d = deep_compare(&expected, &actual);
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].path, "$.order.items[1].sku");
    }

    #[test]
    fn type_mismatch_stops_recursion() {
        let d = deep_compare(&json!({"a": {"b": 1, "c": 2}}), &json!({"a": [1, 2]}));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].path, "$.a");
        assert!(d[0].message.contains("type mismatch expected object, got array"));
    }

    #[test]
    fn status_drift_is_reported_at_its_path() {
        let d = deep_compare(&json!({"status": "PENDING"}), &json!({"status": "CAPTURED"}));
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].path, "$.status");
        assert_eq!(d[0].expected, json!("PENDING"));
        assert_eq!(d[0].actual, json!("CAPTURED"));
    }

    #[test]
    fn format_joins_messages() {
        let d = deep_compare(&json!({"a": 1, "b": 2}), &json!({"a": 2, "b": 3}));
        assert_eq!(format_diffs(&d),
                   "path $.a: value mismatch expected 1, got 2; path $.b: value mismatch expected 2, got 3");
        assert_eq!(format_diffs(&[]), "");
    }

    #[test]
    fn compare_str_reports_equality() {
        let (msg, equal) = deep_compare_str(&json!({"k": [1]}), &json!({"k": [1]}));
        assert!(equal);
        assert!(msg.is_empty());
        let (msg, equal) = deep_compare_str(&json!({"k": [1]}), &json!({"k": [2]}));
        assert!(!equal);
        assert!(msg.contains("$.k[0]"));
    }
}
