//! Validador intercambiable. El motor no lo invoca durante `finish`; lo usan
//! colaboradores externos que quieren un veredicto rápido sobre un par
//! esperado/observado.

use serde_json::Value;

use super::{deep_compare_str, type_name};

pub trait Validator: Send + Sync {
    /// `Ok(())` si `actual` satisface `expected`; en otro caso un mensaje.
    fn validate(&self, expected: &Value, actual: &Value) -> Result<(), String>;
}

/// Chequeo de tipo en la raíz seguido de la comparación profunda.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralValidator;

impl Validator for StructuralValidator {
    fn validate(&self, expected: &Value, actual: &Value) -> Result<(), String> {
        if !expected.is_null() && !actual.is_null() && type_name(expected) != type_name(actual) {
            return Err(format!("Type mismatch: expected {}, got {}",
                               type_name(expected),
                               type_name(actual)));
        }
        match deep_compare_str(expected, actual) {
            (_, true) => Ok(()),
            (diff, false) => Err(diff),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_type_mismatch_is_reported_first() {
        let err = StructuralValidator.validate(&json!({"a": 1}), &json!([1])).unwrap_err();
        assert_eq!(err, "Type mismatch: expected object, got array");
    }

    #[test]
    fn delegates_to_deep_compare() {
        assert!(StructuralValidator.validate(&json!({"a": 1}), &json!({"a": 1})).is_ok());
        let err = StructuralValidator.validate(&json!({"a": 1}), &json!({"a": 2})).unwrap_err();
        assert!(err.contains("$.a"));
    }

    #[test]
    fn usable_as_trait_object() {
        let v: Box<dyn Validator> = Box::new(StructuralValidator);
        assert!(v.validate(&json!(null), &json!(null)).is_ok());
        assert!(v.validate(&json!(null), &json!(1)).is_err());
    }
}
