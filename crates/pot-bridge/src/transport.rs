//! Transportes del puente.
//!
//! Un `Transport` sólo sabe entregar un `Envelope` al otro lado; la recepción
//! siempre termina en un `Inbox` que consume `Bridge::run`.
//!
//! - `MemoryTransport`: canal mpsc en el mismo proceso (tests, `pair()`).
//! - `LineTransport`: JSON Lines sobre cualquier `AsyncWrite` (stdio de un
//!   proceso hijo, pipes, `tokio::io::duplex`).

use log::{debug, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::envelope::Envelope;
use crate::errors::BridgeError;

/// Lado receptor que alimenta el dispatcher de un `Bridge`.
pub type Inbox = mpsc::UnboundedReceiver<Envelope>;

/// Entrega de sobres hacia el otro extremo.
///
/// Contrato:
/// - `post` no bloquea ni suspende.
/// - Devuelve `BridgeError::TransportClosed` si el otro extremo ya no existe.
pub trait Transport: Send + Sync + 'static {
    fn post(&self, envelope: Envelope) -> Result<(), BridgeError>;
}

#[derive(Clone)]
pub struct MemoryTransport {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl MemoryTransport {
    /// Crea el transporte y el `Inbox` donde aparecen sus sobres.
    pub fn channel() -> (Self, Inbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for MemoryTransport {
    fn post(&self, envelope: Envelope) -> Result<(), BridgeError> {
        self.tx.send(envelope).map_err(|_| BridgeError::TransportClosed)
    }
}

/// JSON Lines: un sobre por línea.
///
/// Una tarea de escritura es dueña del sink; `post` sólo encola. Si la
/// escritura falla la tarea termina y los `post` siguientes devuelven
/// `TransportClosed`. La tarea escribe todo lo encolado y cierra el sink
/// cuando se suelta el último clon del transporte.
#[derive(Clone)]
pub struct LineTransport {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl LineTransport {
    /// Requiere un runtime de Tokio activo. El `JoinHandle` termina cuando
    /// la tarea de escritura vació su cola.
    pub fn spawn<W>(writer: W) -> (Self, JoinHandle<()>)
        where W: AsyncWrite + Unpin + Send + 'static
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        let task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(env) = rx.recv().await {
                let mut line = match serde_json::to_vec(&env) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("line transport: encode failed, dropping envelope: {e}");
                        continue;
                    }
                };
                line.push(b'\n');
                if let Err(e) = writer.write_all(&line).await {
                    warn!("line transport: write failed, closing: {e}");
                    break;
                }
                if let Err(e) = writer.flush().await {
                    warn!("line transport: flush failed, closing: {e}");
                    break;
                }
            }
            if let Err(e) = writer.shutdown().await {
                debug!("line transport: shutdown: {e}");
            }
            debug!("line transport: writer finished");
        });
        (Self { tx }, task)
    }
}

impl Transport for LineTransport {
    fn post(&self, envelope: Envelope) -> Result<(), BridgeError> {
        self.tx.send(envelope).map_err(|_| BridgeError::TransportClosed)
    }
}

/// Lee sobres (uno por línea) y los entrega en un `Inbox`. Las líneas vacías
/// se ignoran; las malformadas se registran y se descartan. El `Inbox` se
/// cierra al llegar EOF o ante un error de lectura.
pub fn spawn_line_reader<R>(reader: R) -> Inbox
    where R: AsyncBufRead + Unpin + Send + 'static
{
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Envelope>(&line) {
                        Ok(env) => {
                            if tx.send(env).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("line reader: malformed envelope skipped: {e}"),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("line reader: read failed: {e}");
                    break;
                }
            }
        }
        debug!("line reader: finished");
    });
    rx
}

/// Un enlace JSON Lines completo: transporte de salida, `Inbox` de entrada y
/// la tarea de escritura.
pub struct LineLink {
    pub transport: LineTransport,
    pub inbox: Inbox,
    /// Esperarla, después de soltar el transporte, garantiza que todo lo
    /// publicado llegó al sink.
    pub writer: JoinHandle<()>,
}

pub fn line_link<R, W>(reader: R, writer: W) -> LineLink
    where R: AsyncBufRead + Unpin + Send + 'static,
          W: AsyncWrite + Unpin + Send + 'static
{
    let (transport, writer) = LineTransport::spawn(writer);
    LineLink { transport, inbox: spawn_line_reader(reader), writer }
}

/// Enlace sobre stdin/stdout del proceso actual.
pub fn stdio() -> LineLink {
    line_link(tokio::io::BufReader::new(tokio::io::stdin()), tokio::io::stdout())
}
