//! Inicialización de `env_logger`. Los logs van a stderr: stdout queda libre
//! para el transporte JSON Lines del puente (`potdesk serve`).
//!
//! El filtro sale sólo de `AppConfig::log_filter` (`POTDESK_LOG`); `RUST_LOG`
//! no se consulta.

use env_logger::{Builder, Target};

pub fn builder(filter: &str) -> Builder {
    let mut builder = Builder::new();
    builder.parse_filters(filter)
           .target(Target::Stderr)
           .format_timestamp_millis();
    builder
}

/// Idempotente: una segunda llamada no hace nada.
pub fn init(filter: &str) {
    let _ = builder(filter).try_init();
}
