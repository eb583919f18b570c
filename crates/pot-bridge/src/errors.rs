//! Errores del puente.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum BridgeError {
    #[error("transport closed")]
    TransportClosed,
    #[error("no handler registered for '{0}'")]
    NoHandler(String),
    #[error("handler already registered for '{0}'")]
    HandlerExists(String),
    #[error("remote handler failed: {0}")]
    Remote(String),
    #[error("payload for '{channel}' does not match its contract: {reason}")]
    Payload { channel: String, reason: String },
    #[error("codec: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}
