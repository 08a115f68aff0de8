//! Ciclo completo del motor sobre Postgres (requiere DATABASE_URL).

mod test_support;

use flow_core::{DiscrepancyKind, FlowClient, FlowStatus, PointOptions};
use serde_json::json;
use test_support::{storage, unique};

async fn client(service: &str, max_executions: u32) -> Option<FlowClient> {
    let s = storage()?;
    Some(FlowClient::builder().with_storage(s)
                              .with_service_name(service)
                              .with_max_executions(max_executions)
                              .with_caching(true, 100)
                              .build()
                              .await
                              .expect("client"))
}

#[tokio::test]
async fn two_services_reconcile_successfully() {
    let Some(producer) = client("service-a", 0).await else { return };
    let Some(consumer) = client("service-b", 0).await else { return };
    let name = unique("Order Processing");

    let f = producer.start(&name, Some("ORD-1")).await.unwrap();
    f.create_point("created", &json!({"status": "RECEIVED", "total": 150.5}), PointOptions::new())
     .await
     .unwrap();
    f.create_point("paid", &json!({"status": "CAPTURED"}), PointOptions::new()).await.unwrap();

    let mut g = consumer.get_flow(&name, Some("ORD-1")).await.unwrap();
    assert_eq!(g.flow_info().id, f.flow_info().id);
    g.add_assertion(&json!({"total": 150.5, "status": "RECEIVED"})).await.unwrap();
    g.add_assertion(&json!({"status": "CAPTURED"})).await.unwrap();

    let res = g.finish().await.unwrap();
    assert!(res.success, "{:?}", res.discrepancies);
    assert!(consumer.get_flow(&name, Some("ORD-1")).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn drift_and_missing_assertion_are_reported() {
    let Some(client) = client("svc", 0).await else { return };
    let mut f = client.start(&unique("drift"), None).await.unwrap();
    f.create_point("a", &json!({"status": "PENDING"}), PointOptions::new()).await.unwrap();
    f.create_point("b", &json!({"ok": true}), PointOptions::new()).await.unwrap();
    f.add_assertion(&json!({"status": "CAPTURED"})).await.unwrap();

    let res = f.finish().await.unwrap();
    assert!(!res.success);
    assert_eq!(res.error_count, 2);
    assert_eq!(res.discrepancies[0].kind, DiscrepancyKind::ValueMismatch);
    assert_eq!(res.discrepancies[0].entries[0].path, "$.status");
    assert_eq!(res.discrepancies[1].kind, DiscrepancyKind::MissingAssertion);
}

#[tokio::test]
async fn execution_limit_applies_across_clients() {
    let Some(a) = client("svc-a", 2).await else { return };
    let Some(b) = client("svc-b", 2).await else { return };
    let name = unique("limited");
    a.start(&name, None).await.unwrap();
    b.start(&name, None).await.unwrap();
    let third = a.start(&name, None).await.unwrap();
    assert_eq!(third.status(), FlowStatus::SkippedLimit);
}
