//! pot-schema
//!
//! Conjunto de definiciones de esquema de la aplicación de escritorio: cinco
//! pasos de creación de tablas, aplicados en orden y sólo hacia adelante.
//!
//! Módulos:
//! - `migrations`: pasos declarativos (`MIGRATIONS`), aplicación cruda y el
//!   runner que registra qué pasos ya corrieron.
//! - `schema`: tablas Diesel declaradas para compilar inserts/lecturas.
//! - `rows`: filas `Insertable`/`Queryable` de cada tabla.
//! - `sqlite`: pool r2d2, proveedor de conexiones, introspección y reintentos.
//! - `config`: carga de configuración desde .env.

pub mod config;
pub mod error;
pub mod migrations;
pub mod rows;
pub mod schema;
pub mod sqlite;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use migrations::{apply_all, apply_step, AppliedMigration, ColumnDef, ColumnKind, MigrationRunner, MigrationStep, Rollback, TableDef, MIGRATIONS};
pub use sqlite::{build_pool, establish, SqliteConnection, list_tables, table_columns, ColumnInfo, ConnectionProvider, PoolProvider, SqlitePool};
