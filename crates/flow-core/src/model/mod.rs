//! Modelo de dominio: flows, puntos de expectativa, aserciones observadas y
//! el resultado de la reconciliación.

pub mod flow;
pub mod point;
pub mod result;

pub use flow::{normalize_identifier, Flow, FlowStatus, ParseStatusError};
pub use point::{Assertion, NewPoint, Point, PointOptions};
pub use result::{Discrepancy, DiscrepancyKind, FinishResult};
