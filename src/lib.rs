//! potdesk
//!
//! Librería de la aplicación de escritorio:
//! - `config`, `errors`, `logging`: stack común del binario.
//! - `channels`, `host`: contratos y handlers del lado anfitrión del puente.
//! - `commands`: subcomandos del CLI sobre el runner de esquema.
//!
//! Los componentes viven en `pot-schema` y `pot-bridge`; se re-exportan aquí.

pub mod channels;
pub mod commands;
pub mod config;
pub mod errors;
pub mod host;
pub mod logging;

pub use config::AppConfig;
pub use errors::AppError;
pub use pot_bridge as bridge;
pub use pot_schema as schema;
