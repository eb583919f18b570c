//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable.
//!
//! Variables:
//! - `DATABASE_URL`, `DATABASE_MIN_CONNECTIONS`, `DATABASE_MAX_CONNECTIONS`
//!   (ver `pot_schema::DbConfig`).
//! - `POTDESK_LOG`: filtro de `env_logger` (por defecto `info`).
use std::env;

use pot_schema::DbConfig;

use crate::errors::AppError;

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Configuración global de la aplicación.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Configuración específica de base de datos.
    pub database: DbConfig,
    /// Filtro de logging (sintaxis de `env_logger`).
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        pot_schema::init_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let database = DbConfig::from_lookup(&lookup).map_err(|e| AppError::Config(e.to_string()))?;
        let log_filter = lookup("POTDESK_LOG").filter(|v| !v.trim().is_empty())
                                              .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Ok(Self { database, log_filter })
    }

    /// Sobrescribe la ruta de la base (flag `--database` del CLI).
    pub fn with_database_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.database.url = url;
        }
        self
    }
}
