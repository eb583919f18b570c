//! Lado anfitrión: registra los handlers de `invoke` y sirve el puente.
//!
//! El trabajo con la base es síncrono (Diesel); corre en `spawn_blocking`
//! para no bloquear el despacho del puente.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use log::{info, warn};
use pot_bridge::{Bridge, LineLink, Side};
use pot_schema::{ConnectionProvider, MigrationRunner, PersistenceError};

use crate::channels::{Ping, PingRequest, PingResponse, SchemaStatus, SchemaStatusResponse};
use crate::errors::AppError;

pub const HOST_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn schema_status<P: ConnectionProvider + ?Sized>(provider: &P) -> Result<SchemaStatusResponse, PersistenceError> {
    let mut conn = provider.connection()?;
    let runner = MigrationRunner::new();
    let applied = runner.applied(&mut conn)?;
    let pending = runner.pending(&mut conn)?
                        .iter()
                        .map(|s| s.version.to_string())
                        .collect();
    Ok(SchemaStatusResponse { applied, pending })
}

/// Registra los handlers del anfitrión en `bridge`.
pub fn register_handlers<P: ConnectionProvider>(bridge: &Bridge, provider: Arc<P>) -> Result<(), AppError> {
    bridge.handle_typed::<Ping, _, _>(|req: PingRequest| async move {
              Ok(PingResponse { message: req.message,
                                host_version: HOST_VERSION.to_string(),
                                at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true) })
          })?;

    bridge.handle_typed::<SchemaStatus, _, _>(move |_: ()| {
              let provider = provider.clone();
              async move {
                  tokio::task::spawn_blocking(move || schema_status(provider.as_ref()))
                      .await
                      .map_err(|e| format!("schema status task: {e}"))?
                      .map_err(|e| e.to_string())
              }
          })?;
    Ok(())
}

/// Sirve el puente sobre `link` hasta que su entrada se cierre.
///
/// Al volver, toda respuesta a un `invoke` recibido ya fue escrita en el sink:
/// `run` espera a los handlers en curso y luego se espera al writer.
pub async fn serve<P: ConnectionProvider>(provider: Arc<P>, link: LineLink) -> Result<(), AppError> {
    let LineLink { transport, inbox, writer } = link;
    let bridge = Bridge::new(Side::Host, transport);
    register_handlers(&bridge, provider)?;
    info!("host bridge serving");
    bridge.run(inbox).await;
    // soltar el último transporte cierra la cola del writer
    drop(bridge);
    if let Err(e) = writer.await {
        warn!("host bridge writer: {e}");
    }
    info!("host bridge stopped");
    Ok(())
}

/// Sirve el puente sobre stdin/stdout hasta que stdin se cierre.
pub async fn serve_stdio<P: ConnectionProvider>(provider: Arc<P>) -> Result<(), AppError> {
    serve(provider, pot_bridge::stdio()).await
}
