//! Migraciones Diesel embebidas (`migrations/` de este crate).

use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::debug;

use crate::error::PersistenceError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

// Clave arbitraria del advisory lock que serializa migraciones entre procesos.
const MIGRATION_LOCK_KEY: i64 = 0x666c_6f77_7472;

/// Aplica las migraciones pendientes. Idempotente; varios procesos pueden
/// llamarla a la vez.
pub fn run_pending_migrations(conn: &mut PgConnection) -> Result<(), PersistenceError> {
    conn.batch_execute(&format!("SELECT pg_advisory_lock({MIGRATION_LOCK_KEY});"))?;
    let result = conn.run_pending_migrations(MIGRATIONS)
                     .map(|applied| debug!("migrations applied: {}", applied.len()))
                     .map_err(|e| PersistenceError::Unknown(format!("migration error: {e}")));
    let unlocked = conn.batch_execute(&format!("SELECT pg_advisory_unlock({MIGRATION_LOCK_KEY});"))
                       .map_err(PersistenceError::from);
    result.and(unlocked)
}
