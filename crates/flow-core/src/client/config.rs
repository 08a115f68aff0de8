//! Configuración de un cliente de flows.

use std::time::Duration;

/// Tamaño del pool de conexiones. Lo consume el backend de persistencia al
/// construir su pool; el motor sólo lo transporta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Conexiones inactivas mínimas que el pool intenta conservar.
    pub max_idle: u32,
    /// Límite total de conexiones abiertas.
    pub max_open: u32,
    /// Vida máxima de una conexión; `None` = sin límite.
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_idle: 2,
               max_open: 16,
               max_lifetime: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowConfig {
    /// Nombre del servicio que reporta flows, puntos y aserciones.
    pub service_name: String,
    /// Modo producción: todas las operaciones son no-ops inertes.
    pub production: bool,
    /// Máximo de ejecuciones históricas por nombre; 0 = sin límite.
    pub max_executions: u32,
    pub cache_enabled: bool,
    pub max_cache_size: usize,
    /// Plazo aplicado a cada operación del motor; cero = sin plazo.
    pub timeout: Duration,
    pub pool: PoolConfig,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self { service_name: String::new(),
               production: false,
               max_executions: 0,
               cache_enabled: false,
               max_cache_size: 1000,
               timeout: Duration::from_secs(30),
               pool: PoolConfig::default() }
    }
}

impl FlowConfig {
    pub fn limit_enabled(&self) -> bool {
        self.max_executions > 0
    }

    /// `true` si `count` ejecuciones previas alcanzan el límite configurado.
    pub fn limit_reached(&self, count: u64) -> bool {
        self.limit_enabled() && count >= u64::from(self.max_executions)
    }
}
