//! Pasos de esquema y runner de migraciones.
//!
//! Cada paso crea exactamente una tabla; ninguno altera ni elimina tablas de
//! otro paso. El esquema sólo avanza: `down` nunca ejecuta SQL y devuelve
//! `Rollback::Irreversible`.
//!
//! Dos niveles de uso:
//! - `apply_step` / `apply_all`: aplicación cruda. Aplicar dos veces falla
//!   (no se usa `IF NOT EXISTS`).
//! - `MigrationRunner`: registra en `__pot_schema_migrations` qué pasos ya
//!   corrieron y sólo aplica los pendientes.

use chrono::{SecondsFormat, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::schema::__pot_schema_migrations;
use crate::sqlite::{list_tables, table_columns};

/// Tabla de bookkeeping del runner.
pub const TRACKING_TABLE: &str = "__pot_schema_migrations";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// TEXT sin restricciones (nullable).
    Text,
    /// INTEGER PRIMARY KEY AUTOINCREMENT.
    AutoIncrementKey,
}

impl ColumnKind {
    /// Tipo declarado tal como lo reporta `pragma_table_info`.
    pub fn declared_type(self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::AutoIncrementKey => "INTEGER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn text(name: &'static str) -> ColumnDef {
    ColumnDef { name, kind: ColumnKind::Text }
}

const fn key(name: &'static str) -> ColumnDef {
    ColumnDef { name, kind: ColumnKind::AutoIncrementKey }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    /// `CREATE TABLE` sin `IF NOT EXISTS`: una tabla existente es un error.
    pub fn create_sql(&self) -> String {
        let cols: Vec<String> = self.columns
                                    .iter()
                                    .map(|c| match c.kind {
                                        ColumnKind::Text => format!("\"{}\" TEXT", c.name),
                                        ColumnKind::AutoIncrementKey => format!("\"{}\" INTEGER PRIMARY KEY AUTOINCREMENT", c.name),
                                    })
                                    .collect();
        format!("CREATE TABLE \"{}\" ({});", self.name, cols.join(", "))
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }
}

/// Resultado de pedirle a un paso que se revierta.
///
/// Ningún paso define una inversa; el tipo existe para que quien llame no
/// confunda "no hizo nada" con "revirtió".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollback {
    /// El paso no tiene inversa. El esquema queda intacto.
    Irreversible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStep {
    pub version: &'static str,
    pub name: &'static str,
    pub table: TableDef,
}

impl MigrationStep {
    pub fn up(&self, conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
        debug!("up:start version={} table={}", self.version, self.table.name);
        conn.batch_execute(&self.table.create_sql())?;
        Ok(())
    }

    /// No ejecuta nada contra `conn`.
    pub fn down(&self, _conn: &mut SqliteConnection) -> Rollback {
        debug!("down:noop version={} table={}", self.version, self.table.name);
        Rollback::Irreversible
    }
}

pub static MIGRATIONS: [MigrationStep; 5] = [
    MigrationStep { version: "20240111083000",
                    name: "create_workspaces",
                    table: TableDef { name: "workspaces",
                                      columns: &[key("id"), text("name")] } },
    MigrationStep { version: "20240115091500",
                    name: "create_pot_dept_user_info",
                    table: TableDef { name: "pot_dept_user_info",
                                      columns: &[text("deptUserId"), text("dataType"), text("userNick"), text("userId")] } },
    MigrationStep { version: "20240115092000",
                    name: "create_weather_info",
                    table: TableDef { name: "weather_info",
                                      columns: &[text("dictCode"),
                                                 text("dataType"),
                                                 text("dictValue"),
                                                 text("dictLabel"),
                                                 text("dictSort")] } },
    MigrationStep { version: "20240116100500",
                    name: "create_pot_work_detail_ing",
                    table: TableDef { name: "pot_work_detail_ing",
                                      columns: &[text("dataType"),
                                                 text("potWorkItemId"),
                                                 text("potPositionId"),
                                                 text("potWorkDetailId")] } },
    MigrationStep { version: "20240116101000",
                    name: "create_pot_attribute_ing",
                    table: TableDef { name: "pot_attribute_ing",
                                      columns: &[text("dataType"),
                                                 text("potWorkItemId"),
                                                 text("potPositionId"),
                                                 text("attributeId"),
                                                 text("dataValue")] } },
];

/// Aplica un paso sin registrarlo. Falla si la tabla ya existe.
pub fn apply_step(conn: &mut SqliteConnection, step: &MigrationStep) -> Result<(), PersistenceError> {
    step.up(conn).map_err(|e| PersistenceError::MigrationFailed { version: step.version.to_string(),
                                                                  source: Box::new(e) })
}

/// Aplica los cinco pasos en orden sin registrarlos; aborta en el primer fallo
/// sin deshacer los anteriores.
pub fn apply_all(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    for step in MIGRATIONS.iter() {
        apply_step(conn, step)?;
    }
    Ok(())
}

/// Fila de `__pot_schema_migrations`.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = __pot_schema_migrations)]
pub struct AppliedMigration {
    pub version: String,
    pub name: String,
    pub applied_at: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = __pot_schema_migrations)]
struct NewAppliedMigration<'a> {
    version: &'a str,
    name: &'a str,
    applied_at: &'a str,
}

/// Runner externo: lleva la cuenta de qué pasos ya corrieron.
#[derive(Debug, Clone, Copy)]
pub struct MigrationRunner {
    steps: &'static [MigrationStep],
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationRunner {
    pub fn new() -> Self {
        Self { steps: &MIGRATIONS }
    }

    pub fn steps(&self) -> &'static [MigrationStep] {
        self.steps
    }

    pub fn ensure_tracking_table(&self, conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
        conn.batch_execute(&format!("CREATE TABLE IF NOT EXISTS \"{TRACKING_TABLE}\" (version TEXT PRIMARY KEY NOT NULL, name TEXT NOT NULL, applied_at TEXT NOT NULL);"))?;
        Ok(())
    }

    /// Pasos registrados, ordenados por versión.
    pub fn applied(&self, conn: &mut SqliteConnection) -> Result<Vec<AppliedMigration>, PersistenceError> {
        self.ensure_tracking_table(conn)?;
        let rows = __pot_schema_migrations::table.order(__pot_schema_migrations::version.asc())
                                                 .select(AppliedMigration::as_select())
                                                 .load(conn)?;
        Ok(rows)
    }

    pub fn pending(&self, conn: &mut SqliteConnection) -> Result<Vec<&'static MigrationStep>, PersistenceError> {
        let applied = self.applied(conn)?;
        Ok(self.steps
               .iter()
               .filter(|s| !applied.iter().any(|a| a.version == s.version))
               .collect())
    }

    /// Aplica cada paso pendiente en su propia transacción junto con su fila
    /// de registro. Devuelve las versiones aplicadas en esta corrida.
    pub fn run_pending_migrations(&self, conn: &mut SqliteConnection) -> Result<Vec<&'static str>, PersistenceError> {
        let pending = self.pending(conn)?;
        if pending.is_empty() {
            info!("migrations: nothing pending");
            return Ok(vec![]);
        }
        let mut done = Vec::with_capacity(pending.len());
        for step in pending {
            let applied_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            conn.transaction::<_, PersistenceError, _>(|tx| {
                    step.up(tx)?;
                    diesel::insert_into(__pot_schema_migrations::table).values(NewAppliedMigration { version: step.version,
                                                                                                 name: step.name,
                                                                                                 applied_at: &applied_at })
                                                                       .execute(tx)?;
                    Ok(())
                })
                .map_err(|e| PersistenceError::MigrationFailed { version: step.version.to_string(),
                                                                 source: Box::new(e) })?;
            info!("migrations: applied {} ({})", step.version, step.name);
            done.push(step.version);
        }
        Ok(done)
    }

    /// Pide al último paso aplicado que se revierta. Como ningún paso tiene
    /// inversa, el resultado es siempre `Irreversible` y nada cambia.
    /// `Ok(None)` si no hay nada aplicado.
    pub fn revert_last(&self, conn: &mut SqliteConnection) -> Result<Option<&'static MigrationStep>, PersistenceError> {
        let applied = self.applied(conn)?;
        let Some(last) = applied.last() else {
            return Ok(None);
        };
        let Some(step) = self.steps.iter().find(|s| s.version == last.version) else {
            return Err(PersistenceError::Unknown(format!("applied migration {} has no definition", last.version)));
        };
        match step.down(conn) {
            Rollback::Irreversible => {
                warn!("migrations: {} ({}) is irreversible, schema left untouched", step.version, step.name);
                Err(PersistenceError::Irreversible { version: step.version.to_string() })
            }
        }
    }

    /// Compara el esquema vivo con las definiciones de los pasos aplicados.
    pub fn verify(&self, conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
        let applied = self.applied(conn)?;
        let tables = list_tables(conn)?;
        for row in &applied {
            let Some(step) = self.steps.iter().find(|s| s.version == row.version) else {
                continue;
            };
            let def = &step.table;
            if !tables.iter().any(|t| t == def.name) {
                return Err(PersistenceError::SchemaDrift { table: def.name.to_string(),
                                                           expected: "table present".into(),
                                                           found: "missing".into() });
            }
            let live = table_columns(conn, def.name)?;
            let expected: Vec<String> = def.columns
                                           .iter()
                                           .map(|c| format!("{} {}", c.name, c.kind.declared_type()))
                                           .collect();
            let found: Vec<String> = live.iter().map(|c| format!("{} {}", c.name, c.declared_type.to_uppercase())).collect();
            if expected != found {
                return Err(PersistenceError::SchemaDrift { table: def.name.to_string(),
                                                           expected: expected.join(", "),
                                                           found: found.join(", ") });
            }
        }
        Ok(())
    }
}
