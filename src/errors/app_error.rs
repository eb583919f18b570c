use pot_bridge::BridgeError;
use pot_schema::PersistenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error de persistencia: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Error del puente: {0}")]
    Bridge(#[from] BridgeError),
}

impl AppError {
    /// Código de salida del binario: 4 = rechazado (irreversible / drift),
    /// 2 = configuración, 5 = base de datos o transporte.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Persistence(PersistenceError::Irreversible { .. })
            | AppError::Persistence(PersistenceError::SchemaDrift { .. }) => 4,
            AppError::Config(_) | AppError::Persistence(PersistenceError::Config(_)) => 2,
            _ => 5,
        }
    }
}
