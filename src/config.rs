//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y arma la configuración del cliente de
//! flows más la de base de datos.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use flow_core::FlowConfig;
use flow_persistence::{init_dotenv, DbConfig};

use crate::errors::AppError;

/// Configuración de la aplicación.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub flow: FlowConfig,
    /// Configuración específica de base de datos.
    pub database: DbConfig,
}

impl AppConfig {
    /// Lee `FLOW_*` y `DATABASE_*`. Las variables ausentes toman el valor por
    /// defecto de `FlowConfig`; las presentes pero mal formadas son error.
    pub fn from_env() -> Result<Self, AppError> {
        init_dotenv();
        let database = DbConfig::from_env()?;
        let flow = flow_config_from(|key| env::var(key).ok(), database.pool.clone())?;
        Ok(Self { flow, database })
    }
}

/// Arma un `FlowConfig` a partir de una función de lookup (`env::var` en
/// producción, un mapa en tests).
pub fn flow_config_from<F>(lookup: F, pool: flow_core::PoolConfig) -> Result<FlowConfig, AppError>
    where F: Fn(&str) -> Option<String>
{
    let defaults = FlowConfig::default();
    let timeout = match parsed::<u64, _>(&lookup, "FLOW_TIMEOUT_MS")? {
        Some(ms) => Duration::from_millis(ms),
        None => defaults.timeout,
    };
    Ok(FlowConfig { service_name: lookup("FLOW_SERVICE_NAME").unwrap_or_else(|| "flowtrack".to_string()),
                    production: parsed_bool(&lookup, "FLOW_PRODUCTION")?.unwrap_or(defaults.production),
                    max_executions: parsed(&lookup, "FLOW_MAX_EXECUTIONS")?.unwrap_or(defaults.max_executions),
                    cache_enabled: parsed_bool(&lookup, "FLOW_CACHE_ENABLED")?.unwrap_or(defaults.cache_enabled),
                    max_cache_size: parsed(&lookup, "FLOW_CACHE_SIZE")?.unwrap_or(defaults.max_cache_size),
                    timeout,
                    pool })
}

fn parsed<T, F>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
    where T: FromStr,
          F: Fn(&str) -> Option<String>
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim()
                        .parse()
                        .map(Some)
                        .map_err(|_| AppError::Config(format!("{key} inválido: '{raw}'"))),
    }
}

fn parsed_bool<F>(lookup: &F, key: &str) -> Result<Option<bool>, AppError>
    where F: Fn(&str) -> Option<String>
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(None),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") => Ok(Some(true)),
        Some("0") | Some("false") | Some("FALSE") | Some("no") => Ok(Some(false)),
        Some(other) => Err(AppError::Config(format!("{key} inválido: '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<FlowConfig, AppError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        flow_config_from(|k| map.get(k).cloned(), flow_core::PoolConfig::default())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = from_map(&[]).unwrap();
        assert_eq!(cfg.service_name, "flowtrack");
        assert!(!cfg.production);
        assert_eq!(cfg.max_executions, 0);
        assert_eq!(cfg.max_cache_size, 1000);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }

    #[test]
    fn reads_every_variable() {
        let cfg = from_map(&[("FLOW_SERVICE_NAME", "service-a"),
                             ("FLOW_PRODUCTION", "true"),
                             ("FLOW_MAX_EXECUTIONS", "2"),
                             ("FLOW_CACHE_ENABLED", "1"),
                             ("FLOW_CACHE_SIZE", "50"),
                             ("FLOW_TIMEOUT_MS", "1500")]).unwrap();
        assert_eq!(cfg.service_name, "service-a");
        assert!(cfg.production);
        assert_eq!(cfg.max_executions, 2);
        assert!(cfg.cache_enabled);
        assert_eq!(cfg.max_cache_size, 50);
        assert_eq!(cfg.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = from_map(&[("FLOW_MAX_EXECUTIONS", "dos")]).unwrap_err();
        assert_eq!(err.to_string(), "Error de configuración: FLOW_MAX_EXECUTIONS inválido: 'dos'");
        assert!(from_map(&[("FLOW_PRODUCTION", "maybe")]).is_err());
    }
}
