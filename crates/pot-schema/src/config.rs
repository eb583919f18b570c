//! Carga de configuración de conexión desde variables de entorno.
//! Usa convención `DATABASE_URL` (ruta del archivo SQLite) y parámetros
//! opcionales de pool.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::error::PersistenceError;

/// Archivo usado cuando `DATABASE_URL` no está definido.
pub const DEFAULT_DATABASE_URL: &str = "potdesk.sqlite3";

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { url: DEFAULT_DATABASE_URL.to_string(),
               min_connections: 1,
               max_connections: 4 }
    }
}

impl DbConfig {
    pub fn from_env() -> Result<Self, PersistenceError> {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda
    /// arbitraria (usada por `from_env` y por los tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PersistenceError>
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Self::default();
        let url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty())
                                        .unwrap_or(defaults.url);
        let min_connections = parse_u32(&lookup, "DATABASE_MIN_CONNECTIONS", defaults.min_connections)?;
        let max_connections = parse_u32(&lookup, "DATABASE_MAX_CONNECTIONS", defaults.max_connections)?;
        Ok(Self { url, min_connections, max_connections })
    }
}

fn parse_u32<F>(lookup: &F, key: &str, default: u32) -> Result<u32, PersistenceError>
    where F: Fn(&str) -> Option<String>
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim()
                        .parse()
                        .map_err(|_| PersistenceError::Config(format!("{key} inválido: '{raw}'"))),
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
