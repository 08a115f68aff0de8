//! Lifecycle Manager: cliente ligado a configuración e instancias de flow.
//!
//! Flujo típico:
//! 1. `FlowClient::builder()...build().await` (aplica el esquema salvo en
//!    modo producción).
//! 2. `start` o `get_flow` devuelven una `FlowInstance`.
//! 3. `create_point` / `add_assertion` cualquier número de veces.
//! 4. `finish` persiste FINISHED y reconcilia puntos contra aserciones.

pub mod builder;
pub mod config;
pub mod core;
pub mod instance;
pub mod reconcile;

pub use builder::ClientBuilder;
pub use config::{FlowConfig, PoolConfig};
pub use self::core::FlowClient;
pub use instance::FlowInstance;
pub use reconcile::reconcile;
