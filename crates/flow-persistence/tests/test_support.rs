#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use flow_persistence::config::DbConfig;
use flow_persistence::migrations::run_pending_migrations;
use flow_persistence::pg::{build_pool, PgFlowStorage, PgPool};
use once_cell::sync::Lazy;

pub static TEST_POOL: Lazy<Option<PgPool>> = Lazy::new(|| {
    let cfg = DbConfig::from_env().ok()?;
    let mut pool_cfg = cfg.pool.clone();
    pool_cfg.max_idle = 1;
    pool_cfg.max_open = 8;
    match build_pool(&cfg.url, &pool_cfg, Some(Duration::from_secs(30))) {
        Ok(p) => {
            let mut conn = p.get().ok()?;
            if let Err(e) = run_pending_migrations(&mut conn) {
                eprintln!("No se pudieron aplicar migraciones de test: {e}");
                return None;
            }
            Some(p)
        }
        Err(e) => {
            eprintln!("No se pudo construir pool de test: {e}");
            None
        }
    }
});

pub fn with_pool<F, R>(f: F) -> Option<R>
    where F: FnOnce(&PgPool) -> R
{
    TEST_POOL.as_ref().map(f)
}

/// Storage sobre el pool compartido; `None` (con aviso) sin DATABASE_URL.
pub fn storage() -> Option<Arc<PgFlowStorage>> {
    let s = with_pool(|p| Arc::new(PgFlowStorage::from_pool(p.clone())));
    if s.is_none() {
        eprintln!("skip (no DATABASE_URL)");
    }
    s
}

/// Nombre de flow único por test para no chocar entre ejecuciones.
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}
