//! Implementación Postgres (Diesel) de `FlowStorage`.
//!
//! - Las consultas Diesel son síncronas: cada operación corre en
//!   `tokio::task::spawn_blocking` con una conexión del pool r2d2.
//! - `replace_active_flow` interrumpe e inserta dentro de una transacción
//!   read-write serializada por `pg_advisory_xact_lock` sobre la clave
//!   (name, identifier). El índice único parcial `uq_flows_active_key`
//!   respalda la misma regla en el esquema.
//! - Cada conexión nueva fija `statement_timeout`, de modo que una consulta
//!   cuyo futuro fue abandonado se corta también del lado del servidor.

mod rows;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sql_types::Text;
use flow_core::{Assertion, Flow, FlowStatus, FlowStorage, NewPoint, Point, PoolConfig, StorageError};
use log::{debug, error, warn};
use serde_json::Value;

pub use rows::{AssertionRow, FlowRow, NewAssertionRow, NewFlowRow, NewPointRow, PointRow};

use crate::config::DbConfig;
use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::{assertions, flows, points};

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub type PgPooledConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar un pool real o un proveedor alternativo en tests.
/// Debe devolver una conexión válida o `PersistenceError::TransientIo`.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError>;
}

/// `ConnectionProvider` respaldado por un `PgPool`.
#[derive(Clone)]
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Ajustes de sesión aplicados a cada conexión que abre el pool.
#[derive(Debug)]
struct SessionSetup {
    statement_timeout: Option<Duration>,
}

impl r2d2::CustomizeConnection<PgConnection, r2d2::Error> for SessionSetup {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), r2d2::Error> {
        if let Some(t) = self.statement_timeout {
            conn.batch_execute(&format!("SET statement_timeout = {};", t.as_millis()))
                .map_err(r2d2::Error::QueryError)?;
        }
        Ok(())
    }
}

fn session_setup(statement_timeout: Option<Duration>) -> SessionSetup {
    SessionSetup { statement_timeout: statement_timeout.filter(|t| !t.is_zero()) }
}

/// Construye un pool Postgres r2d2.
///
/// - `max_idle` se usa como mínimo de conexiones inactivas y `max_open` como
///   tamaño total; si `max_idle > max_open` se ajusta a `max_open`.
/// - `statement_timeout` se fija en cada conexión nueva (`None` o cero lo
///   dejan en el valor del servidor).
/// - No corre migraciones: eso es `FlowStorage::apply_schema`.
pub fn build_pool(database_url: &str,
                  pool: &PoolConfig,
                  statement_timeout: Option<Duration>)
                  -> Result<PgPool, PersistenceError> {
    let max_open = pool.max_open.max(1);
    if pool.max_idle > max_open {
        warn!("max_idle > max_open ({} > {max_open}), ajustando max_idle=max_open",
              pool.max_idle);
    }
    let min_idle = pool.max_idle.min(max_open);
    let setup = session_setup(statement_timeout);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    r2d2::Pool::builder().min_idle(Some(min_idle))
                         .max_size(max_open)
                         .max_lifetime(pool.max_lifetime)
                         .connection_customizer(Box::new(setup))
                         .build(manager)
                         .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))
}

fn active_flows<'a>(name: &'a str,
                    identifier: Option<&'a str>)
                    -> flows::BoxedQuery<'a, diesel::pg::Pg> {
    flows::table.filter(flows::name.eq(name))
                .filter(flows::identifier.is_not_distinct_from(identifier))
                .filter(flows::status.eq(FlowStatus::Active.as_str()))
                .into_boxed()
}

/// Flow activo más reciente de la clave, en orden de inserción descendente.
fn latest_active_flow<'a>(name: &'a str,
                          identifier: Option<&'a str>)
                          -> flows::BoxedQuery<'a, diesel::pg::Pg> {
    active_flows(name, identifier).order(flows::id.desc())
}

fn points_of(flow_id: i64) -> points::BoxedQuery<'static, diesel::pg::Pg> {
    points::table.filter(points::flow_id.eq(flow_id))
                 .order(points::id.asc())
                 .into_boxed()
}

fn assertions_of(flow_id: i64) -> assertions::BoxedQuery<'static, diesel::pg::Pg> {
    assertions::table.filter(assertions::flow_id.eq(flow_id))
                     .order(assertions::id.asc())
                     .into_boxed()
}

fn interrupt_active(conn: &mut PgConnection, name: &str, identifier: Option<&str>) -> QueryResult<usize> {
    diesel::update(flows::table.filter(flows::name.eq(name))
                               .filter(flows::identifier.is_not_distinct_from(identifier))
                               .filter(flows::status.eq(FlowStatus::Active.as_str())))
        .set((flows::status.eq(FlowStatus::Interrupted.as_str()), flows::updated_at.eq(Utc::now())))
        .execute(conn)
}

fn insert_active(conn: &mut PgConnection,
                 name: &str,
                 identifier: Option<&str>,
                 service: &str)
                 -> QueryResult<FlowRow> {
    diesel::insert_into(flows::table).values(NewFlowRow { name,
                                                          identifier,
                                                          status: FlowStatus::Active.as_str(),
                                                          service: Some(service) })
                                     .get_result(conn)
}

/// Clave del advisory lock de `replace_active_flow`. El separador 0x1F no
/// aparece en nombres legibles.
fn lock_key(name: &str, identifier: Option<&str>) -> String {
    format!("{name}\u{1f}{}", identifier.unwrap_or(""))
}

/// `FlowStorage` sobre Postgres.
pub struct PgFlowStorage<P: ConnectionProvider = PoolProvider> {
    provider: Arc<P>,
}

impl<P: ConnectionProvider> PgFlowStorage<P> {
    pub fn new(provider: P) -> Self {
        Self { provider: Arc::new(provider) }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Corre `f` con una conexión del pool en un hilo bloqueante.
    ///
    /// Soltar el futuro devuelto (timeout del cliente, cancelación del
    /// llamador) no detiene el hilo: la consulta en curso sigue en el
    /// servidor hasta que la corta el `statement_timeout` fijado por
    /// `build_pool`. Sin `statement_timeout` corre hasta terminar.
    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, StorageError>
        where T: Send + 'static,
              F: FnOnce(&mut PgConnection) -> Result<T, PersistenceError> + Send + 'static
    {
        let provider = Arc::clone(&self.provider);
        let joined = tokio::task::spawn_blocking(move || {
                         let mut conn = provider.connection()?;
                         f(&mut *conn)
                     }).await;
        match joined {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(PersistenceError::NotFound)) => Err(StorageError::NotFound),
            Ok(Err(e)) => {
                error!("{op}: {e}");
                Err(StorageError::from(e))
            }
            Err(e) => Err(StorageError::backend(format!("{op}: blocking task failed: {e}"))),
        }
    }
}

impl PgFlowStorage<PoolProvider> {
    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(PoolProvider { pool })
    }

    /// Pool desde `DbConfig`; `statement_timeout` suele ser el timeout del
    /// cliente.
    pub fn connect(cfg: &DbConfig, statement_timeout: Option<Duration>) -> Result<Self, PersistenceError> {
        Ok(Self::from_pool(build_pool(&cfg.url, &cfg.pool, statement_timeout)?))
    }

    pub fn pool(&self) -> &PgPool {
        &self.provider.pool
    }
}

#[async_trait]
impl<P: ConnectionProvider> FlowStorage for PgFlowStorage<P> {
    async fn apply_schema(&self) -> Result<(), StorageError> {
        self.run("apply_schema", run_pending_migrations).await
    }

    async fn count_flows_by_name(&self, name: &str) -> Result<u64, StorageError> {
        let name = name.to_owned();
        self.run("count_flows_by_name", move |conn| {
                let n: i64 = flows::table.filter(flows::name.eq(&name)).count().get_result(conn)?;
                Ok(u64::try_from(n).unwrap_or(0))
            })
            .await
    }

    async fn interrupt_active_flows(&self, name: &str, identifier: Option<&str>) -> Result<u64, StorageError> {
        let name = name.to_owned();
        let identifier = identifier.map(str::to_owned);
        self.run("interrupt_active_flows", move |conn| {
                Ok(interrupt_active(conn, &name, identifier.as_deref())? as u64)
            })
            .await
    }

    async fn insert_flow(&self, name: &str, identifier: Option<&str>, service: &str) -> Result<Flow, StorageError> {
        let name = name.to_owned();
        let identifier = identifier.map(str::to_owned);
        let service = service.to_owned();
        self.run("insert_flow", move |conn| {
                Flow::try_from(insert_active(conn, &name, identifier.as_deref(), &service)?)
            })
            .await
    }

    async fn replace_active_flow(&self,
                                 name: &str,
                                 identifier: Option<&str>,
                                 service: &str)
                                 -> Result<(Flow, u64), StorageError> {
        let name = name.to_owned();
        let identifier = identifier.map(str::to_owned);
        let service = service.to_owned();
        let key = lock_key(&name, identifier.as_deref());
        self.run("replace_active_flow", move |conn| {
                let (row, interrupted) = conn.build_transaction()
                                             .read_write()
                                             .run(|tx| {
                                                 diesel::sql_query("SELECT pg_advisory_xact_lock(hashtext($1))")
                                                     .bind::<Text, _>(key.as_str())
                                                     .execute(tx)?;
                                                 let n = interrupt_active(tx, &name, identifier.as_deref())?;
                                                 let row = insert_active(tx, &name, identifier.as_deref(), &service)?;
                                                 Ok::<_, diesel::result::Error>((row, n))
                                             })?;
                debug!("replace_active_flow: '{name}' id={} interrupted={interrupted}", row.id);
                Ok((Flow::try_from(row)?, interrupted as u64))
            })
            .await
    }

    async fn find_active_flow(&self, name: &str, identifier: Option<&str>) -> Result<Flow, StorageError> {
        let name = name.to_owned();
        let identifier = identifier.map(str::to_owned);
        self.run("find_active_flow", move |conn| {
                let row: FlowRow = latest_active_flow(&name, identifier.as_deref()).first(conn)?;
                Flow::try_from(row)
            })
            .await
    }

    async fn finish_flow(&self, flow_id: i64) -> Result<(), StorageError> {
        self.run("finish_flow", move |conn| {
                let n = diesel::update(flows::table.find(flow_id))
                    .set((flows::status.eq(FlowStatus::Finished.as_str()), flows::updated_at.eq(Utc::now())))
                    .execute(conn)?;
                if n == 0 {
                    debug!("finish_flow: flow {flow_id} no existe");
                }
                Ok(())
            })
            .await
    }

    async fn insert_point(&self, point: &NewPoint) -> Result<i64, StorageError> {
        let point = point.clone();
        let timeout_ms = point.timeout_ms();
        self.run("insert_point", move |conn| {
                let row = NewPointRow { flow_id: point.flow_id,
                                        description: &point.description,
                                        expected: &point.expected,
                                        service_name: Some(point.service_name.as_str()),
                                        validation_schema: point.schema.as_ref(),
                                        timeout_ms };
                let id = diesel::insert_into(points::table).values(&row)
                                                           .returning(points::id)
                                                           .get_result(conn)?;
                Ok(id)
            })
            .await
    }

    async fn insert_assertion(&self, flow_id: i64, actual: &Value, service: &str) -> Result<i64, StorageError> {
        let actual = actual.clone();
        let service = service.to_owned();
        self.run("insert_assertion", move |conn| {
                let row = NewAssertionRow { flow_id,
                                            actual: &actual,
                                            service_name: Some(service.as_str()),
                                            processed_at: Some(Utc::now()) };
                let id = diesel::insert_into(assertions::table).values(&row)
                                                               .returning(assertions::id)
                                                               .get_result(conn)?;
                Ok(id)
            })
            .await
    }

    async fn fetch_points(&self, flow_id: i64) -> Result<Vec<Point>, StorageError> {
        self.run("fetch_points", move |conn| {
                let rows: Vec<PointRow> = points_of(flow_id).load(conn)?;
                Ok(rows.into_iter().map(Point::from).collect())
            })
            .await
    }

    async fn fetch_assertions(&self, flow_id: i64) -> Result<Vec<Assertion>, StorageError> {
        self.run("fetch_assertions", move |conn| {
                let rows: Vec<AssertionRow> = assertions_of(flow_id).load(conn)?;
                Ok(rows.into_iter().map(Assertion::from).collect())
            })
            .await
    }
}
