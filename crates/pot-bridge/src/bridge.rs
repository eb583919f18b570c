//! `Bridge`: las tres primitivas del puente sobre un `Transport`.
//!
//! Modelo de concurrencia:
//! - `send` y `receive` nunca suspenden.
//! - `invoke` es el único punto de suspensión; espera el `Reply` correlacionado
//!   sin timeout. Abandonar el future descarta la respuesta tardía.
//! - `run` despacha el `Inbox` en el runtime actual; los handlers de `invoke`
//!   corren en tareas propias para no bloquear el despacho.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use log::{debug, warn};
use serde_json::Value;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};

use crate::envelope::{Envelope, Outcome};
use crate::errors::BridgeError;
use crate::registry::{Handler, HandlerRegistry, ListenerRegistry};
use crate::transport::{Inbox, MemoryTransport, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Proceso privilegiado.
    Host,
    /// Proceso de UI en sandbox.
    Renderer,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Host => write!(f, "host"),
            Side::Renderer => write!(f, "renderer"),
        }
    }
}

type PendingReply = oneshot::Sender<Result<Value, BridgeError>>;

struct Inner {
    side: Side,
    transport: Box<dyn Transport>,
    listeners: ListenerRegistry,
    handlers: HandlerRegistry,
    pending: DashMap<u64, (String, PendingReply)>,
    next_id: AtomicU64,
    stop: watch::Sender<bool>,
}

/// Handle clonable de un extremo del puente.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

/// Quita la entrada pendiente si el `invoke` se abandona antes del `Reply`.
struct PendingGuard<'a> {
    pending: &'a DashMap<u64, (String, PendingReply)>,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

impl Bridge {
    pub fn new<T: Transport>(side: Side, transport: T) -> Self {
        let (stop, _) = watch::channel(false);
        Self { inner: Arc::new(Inner { side,
                                       transport: Box::new(transport),
                                       listeners: ListenerRegistry::new(),
                                       handlers: HandlerRegistry::new(),
                                       pending: DashMap::new(),
                                       next_id: AtomicU64::new(1),
                                       stop }) }
    }

    pub fn side(&self) -> Side {
        self.inner.side
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.inner.listeners
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.inner.handlers
    }

    /// Cantidad de `invoke` esperando respuesta.
    pub fn pending_invokes(&self) -> usize {
        self.inner.pending.len()
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.stop.borrow()
    }

    /// Fire-and-forget. Cualquier falla del transporte se descarta.
    pub fn send(&self, channel: &str, data: Value) {
        if self.is_closed() {
            debug!("[{}] send on closed bridge dropped channel={channel}", self.inner.side);
            return;
        }
        let env = Envelope::Send { channel: channel.to_string(), args: vec![data] };
        if let Err(e) = self.inner.transport.post(env) {
            debug!("[{}] send dropped channel={channel}: {e}", self.inner.side);
        }
    }

    /// Registra un callback para cada mensaje entrante en `channel`.
    pub fn receive<F>(&self, channel: &str, callback: F)
        where F: Fn(&[Value]) + Send + Sync + 'static
    {
        self.inner.listeners.register(channel, Arc::new(callback));
    }

    /// Envía una petición y espera su respuesta correlacionada.
    pub async fn invoke(&self, channel: &str, args: Vec<Value>) -> Result<Value, BridgeError> {
        if self.is_closed() {
            return Err(BridgeError::TransportClosed);
        }
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.inner.pending.insert(id, (channel.to_string(), tx));
        let _guard = PendingGuard { pending: &self.inner.pending, id };
        // shutdown pudo haber drenado la tabla entre el chequeo y el insert
        if self.is_closed() {
            return Err(BridgeError::TransportClosed);
        }
        debug!("[{}] invoke id={id} channel={channel}", self.inner.side);
        self.inner.transport.post(Envelope::Invoke { id, channel: channel.to_string(), args })?;
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::TransportClosed),
        }
    }

    /// Registra el handler que responde `invoke` en `channel`.
    pub fn handle<F, Fut>(&self, channel: &str, handler: F) -> Result<(), BridgeError>
        where F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
              Fut: Future<Output = Result<Value, String>> + Send + 'static
    {
        let handler: Handler = Arc::new(move |args| handler(args).boxed());
        self.inner.handlers.register(channel, handler)
    }

    /// Despacha un sobre entrante. Debe llamarse dentro de un runtime de Tokio
    /// (los handlers de `invoke` se ejecutan con `tokio::spawn`).
    pub fn dispatch(&self, envelope: Envelope) {
        if let Some(task) = self.route(envelope) {
            tokio::spawn(task);
        }
    }

    /// Enruta un sobre. Para un `Invoke` con handler devuelve la tarea que lo
    /// atiende y publica el `Reply`; quien llama decide dónde correrla.
    fn route(&self, envelope: Envelope) -> Option<BoxFuture<'static, ()>> {
        let side = self.inner.side;
        match envelope {
            Envelope::Send { channel, args } => {
                let fired = self.inner.listeners.fire(&channel, &args);
                debug!("[{side}] send channel={channel} listeners={fired}");
                None
            }
            Envelope::Invoke { id, channel, args } => match self.inner.handlers.get(&channel) {
                None => {
                    debug!("[{side}] invoke id={id} channel={channel}: no handler");
                    self.reply(id, Outcome::NoHandler);
                    None
                }
                Some(handler) => {
                    let bridge = self.clone();
                    Some(async move {
                        // el closure también corre dentro del catch_unwind
                        let call = future::lazy(move |_| handler(args)).flatten();
                        let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                            Ok(result) => Outcome::from(result),
                            Err(_) => {
                                warn!("[{}] handler for '{channel}' panicked", bridge.inner.side);
                                Outcome::Err(format!("handler for '{channel}' panicked"))
                            }
                        };
                        bridge.reply(id, outcome);
                    }.boxed())
                }
            },
            Envelope::Reply { id, outcome } => {
                match self.inner.pending.remove(&id) {
                    Some((_, (channel, tx))) => {
                        let result = match outcome {
                            Outcome::Ok(v) => Ok(v),
                            Outcome::Err(msg) => Err(BridgeError::Remote(msg)),
                            Outcome::NoHandler => Err(BridgeError::NoHandler(channel)),
                        };
                        // el receptor pudo haberse abandonado
                        let _ = tx.send(result);
                    }
                    None => debug!("[{side}] reply id={id} has no pending invoke, discarded"),
                }
                None
            }
        }
    }

    fn reply(&self, id: u64, outcome: Outcome) {
        if let Err(e) = self.inner.transport.post(Envelope::Reply { id, outcome }) {
            debug!("[{}] reply id={id} dropped: {e}", self.inner.side);
        }
    }

    /// Despacha hasta que el `Inbox` se cierre o se llame `shutdown`.
    ///
    /// Si el `Inbox` se cierra con handlers en curso, espera a que publiquen
    /// su `Reply` antes de cerrar (salvo que llegue un `shutdown`).
    pub async fn run(&self, mut inbox: Inbox) {
        let side = self.inner.side;
        let mut stop = self.inner.stop.subscribe();
        let mut in_flight = JoinSet::new();
        loop {
            if *stop.borrow_and_update() {
                break;
            }
            tokio::select! {
                next = inbox.recv() => match next {
                    Some(env) => {
                        if let Some(task) = self.route(env) {
                            in_flight.spawn(task);
                        }
                    }
                    None => break,
                },
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        if !self.is_closed() && !in_flight.is_empty() {
            debug!("[{side}] inbox closed, waiting for {} handler(s)", in_flight.len());
            loop {
                tokio::select! {
                    next = in_flight.join_next() => {
                        if next.is_none() {
                            break;
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow_and_update() {
                            break;
                        }
                    }
                }
            }
        }
        debug!("[{side}] dispatcher stopped");
        self.shutdown();
    }

    /// Vacía ambos registros y falla cada `invoke` pendiente con
    /// `TransportClosed`. Idempotente.
    pub fn shutdown(&self) {
        self.inner.stop.send_replace(true);
        self.inner.listeners.clear();
        self.inner.handlers.clear();
        let ids: Vec<u64> = self.inner.pending.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Some((_, (_, tx))) = self.inner.pending.remove(&id) {
                let _ = tx.send(Err(BridgeError::TransportClosed));
            }
        }
    }
}

/// Un extremo listo para correr: el handle y el `Inbox` que lo alimenta.
pub struct Endpoint {
    pub bridge: Bridge,
    pub inbox: Inbox,
}

impl Endpoint {
    pub fn new(bridge: Bridge, inbox: Inbox) -> Self {
        Self { bridge, inbox }
    }

    /// Lanza el dispatcher en el runtime actual y devuelve el handle.
    pub fn spawn(self) -> (Bridge, JoinHandle<()>) {
        let Endpoint { bridge, inbox } = self;
        let runner = bridge.clone();
        let join = tokio::spawn(async move { runner.run(inbox).await });
        (bridge, join)
    }
}

/// Dos extremos conectados en memoria: `(host, renderer)`.
pub fn pair() -> (Endpoint, Endpoint) {
    let (to_renderer, renderer_inbox) = MemoryTransport::channel();
    let (to_host, host_inbox) = MemoryTransport::channel();
    (Endpoint::new(Bridge::new(Side::Host, to_renderer), host_inbox),
     Endpoint::new(Bridge::new(Side::Renderer, to_host), renderer_inbox))
}
