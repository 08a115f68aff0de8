//! Reconciliación: empareja puntos y aserciones por posición y compara cada
//! par con el comparador estructural.
//!
//! El i-ésimo punto se empareja con la i-ésima aserción (ambas listas ya
//! vienen ordenadas por creación). Los sobrantes de cualquier lado se
//! reportan como `MissingAssertion` u `OrphanAssertion`.

use std::time::Duration;

use chrono::Utc;

use crate::compare::{deep_compare, format_diffs};
use crate::model::{Assertion, Discrepancy, DiscrepancyKind, FinishResult, Point};

pub fn reconcile(points: &[Point], assertions: &[Assertion], execution_time: Duration) -> FinishResult {
    let mut discrepancies = Vec::new();
    for i in 0..points.len().max(assertions.len()) {
        match (points.get(i), assertions.get(i)) {
            (Some(p), Some(a)) => {
                let entries = deep_compare(&p.expected, &a.actual);
                if entries.is_empty() {
                    continue;
                }
                discrepancies.push(Discrepancy { kind: DiscrepancyKind::ValueMismatch,
                                                 point_id: Some(p.id),
                                                 assertion_id: Some(a.id),
                                                 description: p.description.clone(),
                                                 expected: Some(p.expected.clone()),
                                                 actual: Some(a.actual.clone()),
                                                 diff: format_diffs(&entries),
                                                 entries,
                                                 timestamp: Utc::now() });
            }
            (Some(p), None) => discrepancies.push(Discrepancy { kind: DiscrepancyKind::MissingAssertion,
                                                                point_id: Some(p.id),
                                                                assertion_id: None,
                                                                description: p.description.clone(),
                                                                expected: Some(p.expected.clone()),
                                                                actual: None,
                                                                diff: "Missing assertion for this point".to_string(),
                                                                entries: Vec::new(),
                                                                timestamp: Utc::now() }),
            (None, Some(a)) => discrepancies.push(Discrepancy { kind: DiscrepancyKind::OrphanAssertion,
                                                                point_id: None,
                                                                assertion_id: Some(a.id),
                                                                description: "Orphan Assertion".to_string(),
                                                                expected: None,
                                                                actual: Some(a.actual.clone()),
                                                                diff: format!("Assertion #{} found without a matching Point #{}",
                                                                              i + 1,
                                                                              i + 1),
                                                                entries: Vec::new(),
                                                                timestamp: Utc::now() }),
            (None, None) => unreachable!("index bounded by the longer list"),
        }
    }
    FinishResult { success: discrepancies.is_empty(),
                   error_count: discrepancies.len(),
                   discrepancies,
                   execution_time }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn point(id: i64, desc: &str, expected: Value) -> Point {
        Point { id,
                flow_id: 1,
                description: desc.to_string(),
                expected,
                service_name: Some("A".into()),
                schema: None,
                timeout_ms: None,
                created_at: Utc::now() }
    }

    fn assertion(id: i64, actual: Value) -> Assertion {
        Assertion { id,
                    flow_id: 1,
                    actual,
                    service_name: Some("B".into()),
                    processed_at: None,
                    created_at: Utc::now() }
    }

    fn three_points() -> Vec<Point> {
        vec![point(1, "received", json!({"status": "RECEIVED"})),
             point(2, "payment", json!({"status": "PENDING"})),
             point(3, "shipped", json!({"status": "SHIPPED", "items": [1, 2]}))]
    }

    #[test]
    fn matching_pairs_succeed() {
        let points = three_points();
        let assertions: Vec<Assertion> = points.iter()
                                               .enumerate()
                                               .map(|(i, p)| assertion(10 + i as i64, p.expected.clone()))
                                               .collect();
        let res = reconcile(&points, &assertions, Duration::from_millis(5));
        assert!(res.success);
        assert_eq!(res.error_count, 0);
        assert!(res.discrepancies.is_empty());
        assert_eq!(res.execution_time, Duration::from_millis(5));
    }

    #[test]
    fn missing_assertion_references_last_point() {
        let points = three_points();
        let assertions = vec![assertion(10, points[0].expected.clone()), assertion(11, points[1].expected.clone())];
        let res = reconcile(&points, &assertions, Duration::ZERO);
        assert!(!res.success);
        assert_eq!(res.error_count, 1);
        let d = &res.discrepancies[0];
        assert_eq!(d.kind, DiscrepancyKind::MissingAssertion);
        assert_eq!(d.point_id, Some(3));
        assert_eq!(d.assertion_id, None);
        assert_eq!(d.description, "shipped");
    }

    #[test]
    fn orphan_assertion_references_last_assertion() {
        let points = vec![point(1, "a", json!(1)), point(2, "b", json!(2))];
        let assertions = vec![assertion(10, json!(1)), assertion(11, json!(2)), assertion(12, json!(3))];
        let res = reconcile(&points, &assertions, Duration::ZERO);
        assert_eq!(res.error_count, 1);
        let d = &res.discrepancies[0];
        assert_eq!(d.kind, DiscrepancyKind::OrphanAssertion);
        assert_eq!(d.assertion_id, Some(12));
        assert_eq!(d.point_id, None);
        assert_eq!(d.diff, "Assertion #3 found without a matching Point #3");
    }

    #[test]
    fn value_drift_reports_one_discrepancy_at_path() {
        let points = three_points();
        let assertions = vec![assertion(10, json!({"status": "RECEIVED"})),
                              assertion(11, json!({"status": "CAPTURED"})),
                              assertion(12, json!({"status": "SHIPPED", "items": [1, 2]}))];
        let res = reconcile(&points, &assertions, Duration::ZERO);
        assert_eq!(res.error_count, 1);
        let d = &res.discrepancies[0];
        assert_eq!(d.kind, DiscrepancyKind::ValueMismatch);
        assert_eq!((d.point_id, d.assertion_id), (Some(2), Some(11)));
        assert_eq!(d.entries.len(), 1);
        assert_eq!(d.entries[0].path, "$.status");
        assert_eq!(d.expected, Some(json!({"status": "PENDING"})));
        assert_eq!(d.actual, Some(json!({"status": "CAPTURED"})));
        assert_eq!(d.diff, "path $.status: value mismatch expected \"PENDING\", got \"CAPTURED\"");
    }

    #[test]
    fn pairing_is_positional_not_by_description() {
        let points = vec![point(1, "first", json!("a")), point(2, "second", json!("b"))];
        let assertions = vec![assertion(10, json!("b")), assertion(11, json!("a"))];
        let res = reconcile(&points, &assertions, Duration::ZERO);
        assert_eq!(res.error_count, 2);
    }

    #[test]
    fn empty_flow_is_success() {
        let res = reconcile(&[], &[], Duration::ZERO);
        assert!(res.success);
        assert_eq!(res.error_count, 0);
    }
}
