//! flow-core: motor de detección de deriva de contratos entre servicios.
//!
//! Un servicio registra lo que *espera* que ocurra (puntos) y otro registra lo
//! que *observó* (aserciones). Al terminar el flow, el motor empareja ambos
//! por posición y reporta las discrepancias.
//!
//! Módulos:
//! - `compare`: comparador estructural de valores JSON.
//! - `cache`: cache acotada de flows activos.
//! - `storage`: trait `FlowStorage` + backend en memoria.
//! - `client`: ciclo de vida (start/get_flow/create_point/add_assertion/finish).
//! - `model`: tipos de dominio.
//! - `errors`: taxonomía de errores.

pub mod cache;
pub mod client;
pub mod compare;
pub mod errors;
pub mod model;
pub mod storage;

pub use cache::FlowCache;
pub use client::{reconcile, ClientBuilder, FlowClient, FlowConfig, FlowInstance, PoolConfig};
pub use compare::{deep_compare, deep_compare_str, format_diffs, DiffEntry, StructuralValidator, Validator};
pub use errors::{FlowError, FlowErrorKind, StorageError};
pub use model::{Assertion, Discrepancy, DiscrepancyKind, FinishResult, Flow, FlowStatus, NewPoint, Point, PointOptions};
pub use storage::{FlowStorage, InMemoryFlowStorage};
