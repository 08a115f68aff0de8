//! Escenario de demostración "Order Processing": el servicio A registra lo
//! que espera, el servicio B registra lo que observa y cierra el flow.

use flow_core::{FinishResult, FlowClient, FlowError, FlowInstance, PointOptions};
use log::info;
use serde_json::{json, Value};

pub const FLOW_NAME: &str = "Order Processing";

/// Los cuatro pasos del pedido: descripción y payload.
pub fn order_steps() -> Vec<(&'static str, Value)> {
    vec![("Step 1: Order Received",
          json!({"status": "PENDING", "total": 150.50, "customer_id": "CUST-99"})),
         ("Step 2: Risk Analysis",
          json!({"risk_score": 0.05, "approved": true, "source": "internal-ai"})),
         ("Step 3: Payment",
          json!({"provider": "Stripe", "status": "CAPTURED", "amount": 150.50})),
         ("Step 4: Logistics Handover",
          json!({"warehouse": "SP-01", "priority": "HIGH", "estimated_delivery": "2026-02-10"})),]
}

/// Servicio A: inicia el flow del pedido y registra los cuatro puntos.
pub async fn produce(client: &FlowClient, order_id: &str) -> Result<FlowInstance, FlowError> {
    let flow = client.start(FLOW_NAME, Some(order_id)).await?;
    if flow.is_skipped() {
        info!("flow '{FLOW_NAME}' [{order_id}] skipped ({})", flow.status());
        return Ok(flow);
    }
    for (description, expected) in order_steps() {
        flow.create_point(description, &expected, PointOptions::new()).await?;
    }
    Ok(flow)
}

/// Servicio B: recupera el flow, registra las observaciones y lo cierra.
///
/// `observed` reemplaza los payloads por defecto (útil para provocar
/// drift). Devuelve `None` si el flow está omitido.
pub async fn consume(client: &FlowClient,
                     order_id: &str,
                     observed: Option<Vec<Value>>)
                     -> Result<Option<FinishResult>, FlowError> {
    let mut flow = client.get_flow(FLOW_NAME, Some(order_id)).await?;
    if flow.is_skipped() {
        info!("flow '{FLOW_NAME}' [{order_id}] skipped ({}), nothing to process", flow.status());
        return Ok(None);
    }
    let observed = observed.unwrap_or_else(|| order_steps().into_iter().map(|(_, v)| v).collect());
    for actual in &observed {
        flow.add_assertion(actual).await?;
    }
    flow.finish().await.map(Some)
}
