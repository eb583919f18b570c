//! Contratos tipados de los canales que atiende el anfitrión.

use pot_bridge::channel;
use pot_schema::AppliedMigration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
    pub host_version: String,
    /// RFC 3339, UTC.
    pub at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaStatusResponse {
    pub applied: Vec<AppliedMigration>,
    /// Versiones aún no aplicadas, en orden.
    pub pending: Vec<String>,
}

channel!(
    /// Eco con la versión del anfitrión.
    pub Ping: "app:ping" => PingRequest => PingResponse
);

channel!(
    /// Pasos de esquema aplicados y pendientes.
    pub SchemaStatus: "schema:status" => () => SchemaStatusResponse
);
