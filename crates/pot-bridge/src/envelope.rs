//! Sobre que cruza la frontera entre procesos.
//!
//! Es la única forma que viaja por un `Transport`; los canales y payloads
//! siguen siendo opacos para el puente.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Envelope {
    /// Mensaje fire-and-forget.
    Send { channel: String, args: Vec<Value> },
    /// Petición; `id` correlaciona con su `Reply`.
    Invoke { id: u64, channel: String, args: Vec<Value> },
    Reply { id: u64, outcome: Outcome },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    Ok(Value),
    /// El handler del otro lado falló.
    Err(String),
    /// El otro lado no tiene handler para el canal.
    NoHandler,
}

impl From<Result<Value, String>> for Outcome {
    fn from(r: Result<Value, String>) -> Self {
        match r {
            Ok(v) => Outcome::Ok(v),
            Err(e) => Outcome::Err(e),
        }
    }
}
