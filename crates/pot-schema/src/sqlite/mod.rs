//! Conexiones SQLite (Diesel + r2d2), introspección y reintentos.
//!
//! - `SqlitePool` se construye con `min_idle` y `max_size`; al construirlo se
//!   corren una vez los pasos pendientes.
//! - `ConnectionProvider` desacopla a quien consume conexiones del pool
//!   concreto (facilita tests).
//! - `with_retry` repite una unidad de trabajo sólo ante errores transitorios
//!   (SQLITE_BUSY / archivo bloqueado por otro proceso).

use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sql_types::{Integer, Text};
pub use diesel::sqlite::SqliteConnection;
use log::{debug, warn};

use crate::error::PersistenceError;
use crate::migrations::{MigrationRunner, TRACKING_TABLE};

/// Alias de tipo para el pool r2d2 de conexiones SQLite.
pub type SqlitePool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type PooledConnection = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Contrato: devuelve una conexión válida o `PersistenceError::TransientIo`.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PooledConnection, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un
/// `SqlitePool`.
#[derive(Clone)]
pub struct PoolProvider {
    pub pool: SqlitePool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PooledConnection, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Abre una conexión directa, sin pool y sin correr migraciones.
pub fn establish(database_url: &str) -> Result<SqliteConnection, PersistenceError> {
    Ok(SqliteConnection::establish(database_url)?)
}

/// Columna reportada por `pragma_table_info`.
#[derive(QueryableByName, Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Text)]
    pub declared_type: String,
    #[diesel(sql_type = Integer)]
    pub pk: i32,
}

#[derive(QueryableByName, Debug)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

/// Tablas de usuario, en orden alfabético. Excluye las internas de SQLite y
/// la tabla de registro del runner.
pub fn list_tables(conn: &mut SqliteConnection) -> Result<Vec<String>, PersistenceError> {
    let rows: Vec<TableName> =
        diesel::sql_query("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name").load(conn)?;
    Ok(rows.into_iter()
           .map(|r| r.name)
           .filter(|n| n != TRACKING_TABLE)
           .collect())
}

/// Columnas de `table` en orden de declaración. Vacío si la tabla no existe.
pub fn table_columns(conn: &mut SqliteConnection, table: &str) -> Result<Vec<ColumnInfo>, PersistenceError> {
    let rows = diesel::sql_query("SELECT name, type AS declared_type, pk FROM pragma_table_info(?) ORDER BY cid").bind::<Text, _>(table)
                                                                                                                 .load::<ColumnInfo>(conn)?;
    Ok(rows)
}

/// Determina si un error es transitorio (recomendado reintentar con backoff).
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::TransientIo(_) => true,
        PersistenceError::MigrationFailed { source, .. } => is_retryable(source),
        // SQLite reporta BUSY/LOCKED como error genérico; best-effort por texto.
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("database is locked") || m.contains("database table is locked") || m.contains("busy")
        }
        _ => false,
    }
}

/// Retry simple con backoff lineal (hasta 3 reintentos: 15ms, 30ms, 45ms).
///
/// No altera la semántica: sólo repite la unidad de trabajo provista por `f`.
pub fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms", attempts + 1, e, delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Construye un pool SQLite r2d2 a partir de la ruta del archivo.
///
/// - Ajusta tamaños (0 -> 1; si `min_size > max_size`, usa `min = max`).
/// - Corre los pasos pendientes con la primera conexión.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<SqlitePool, PersistenceError> {
    let validated_min = min_size.max(1);
    let validated_max = max_size.max(1);
    if validated_min > validated_max {
        warn!("min_size > max_size ({} > {}), ajustando min=max", validated_min, validated_max);
    }
    let final_min = validated_min.min(validated_max);
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(final_min))
                                    .max_size(validated_max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        let applied = with_retry(|| MigrationRunner::new().run_pending_migrations(&mut conn))?;
        debug!("build_pool: url={database_url} applied={applied:?}");
    }
    Ok(pool)
}
