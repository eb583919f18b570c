//! pot-bridge: puente entre el proceso anfitrión (privilegiado) y el proceso
//! de UI (sandbox).
//!
//! Tres primitivas, sin framing ni reintentos propios:
//! - `send`: fire-and-forget.
//! - `receive`: registra un callback por canal; todos los registrados disparan.
//! - `invoke`: request/response correlacionado, sin timeout.
//!
//! Encima de la superficie posicional (`Vec<Value>`) existe una capa tipada
//! (`ChannelContract`, macro `channel!`) que fija request/response por canal.

pub mod bridge;
pub mod envelope;
pub mod errors;
pub mod registry;
pub mod transport;
pub mod typed;

pub use bridge::{pair, Bridge, Endpoint, Side};
pub use envelope::{Envelope, Outcome};
pub use errors::BridgeError;
pub use registry::{HandlerRegistry, ListenerRegistry};
pub use transport::{line_link, spawn_line_reader, stdio, Inbox, LineLink, LineTransport, MemoryTransport, Transport};
pub use typed::ChannelContract;
