//! Configuración de conexión desde variables de entorno.
//! Convención `DATABASE_URL` más parámetros opcionales de pool.

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use flow_core::PoolConfig;
use once_cell::sync::Lazy;

use crate::error::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub url: String,
    pub pool: PoolConfig,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, PersistenceError> {
        init_dotenv();
        let url = env::var("DATABASE_URL").map_err(|_| PersistenceError::Config("DATABASE_URL no definido".into()))?;
        let defaults = PoolConfig::default();
        let pool = PoolConfig { max_idle: parse_var("DATABASE_MIN_CONNECTIONS").unwrap_or(defaults.max_idle),
                                max_open: parse_var("DATABASE_MAX_CONNECTIONS").unwrap_or(defaults.max_open),
                                max_lifetime: parse_var("DATABASE_MAX_LIFETIME_SECS").map(Duration::from_secs) };
        Ok(Self { url, pool })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
