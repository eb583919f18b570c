//! Subcomandos del CLI. Escriben en `out` para poder testearlos.

use std::io::Write;

use pot_schema::{MigrationRunner, SqliteConnection};

use crate::errors::AppError;

pub fn migrate(conn: &mut SqliteConnection, out: &mut impl Write) -> Result<(), AppError> {
    let applied = MigrationRunner::new().run_pending_migrations(conn)?;
    if applied.is_empty() {
        writeln!(out, "nothing pending")?;
    }
    for version in applied {
        writeln!(out, "applied {version}")?;
    }
    Ok(())
}

pub fn status(conn: &mut SqliteConnection, out: &mut impl Write) -> Result<(), AppError> {
    let runner = MigrationRunner::new();
    for row in runner.applied(conn)? {
        writeln!(out, "applied  {} {} ({})", row.version, row.name, row.applied_at)?;
    }
    for step in runner.pending(conn)? {
        writeln!(out, "pending  {} {}", step.version, step.name)?;
    }
    Ok(())
}

/// Siempre termina en `Irreversible` si hay algo aplicado.
pub fn rollback(conn: &mut SqliteConnection, out: &mut impl Write) -> Result<(), AppError> {
    match MigrationRunner::new().revert_last(conn)? {
        None => writeln!(out, "nothing applied")?,
        Some(step) => writeln!(out, "reverted {}", step.version)?,
    }
    Ok(())
}

pub fn verify(conn: &mut SqliteConnection, out: &mut impl Write) -> Result<(), AppError> {
    MigrationRunner::new().verify(conn)?;
    writeln!(out, "schema ok")?;
    Ok(())
}
