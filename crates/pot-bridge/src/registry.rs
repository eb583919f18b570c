//! Registros explícitos de listeners (`receive`) y handlers (`handle`).
//!
//! Cada `Bridge` es dueño de los suyos: se crean con el puente y se vacían en
//! `shutdown`. No hay estado global de módulo.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::errors::BridgeError;

pub type Listener = Arc<dyn Fn(&[Value]) + Send + Sync>;
pub type Handler = Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;

/// Callbacks de `receive` por canal, en orden de registro. Sin unsubscribe.
#[derive(Default)]
pub struct ListenerRegistry {
    by_channel: DashMap<String, Vec<Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, channel: &str, listener: Listener) {
        self.by_channel.entry(channel.to_string()).or_default().push(listener);
    }

    /// Dispara todos los listeners del canal y devuelve cuántos hubo.
    ///
    /// Los callbacks se clonan fuera del mapa antes de invocarlos: un callback
    /// puede registrar otros sin bloquear el shard.
    pub fn fire(&self, channel: &str, args: &[Value]) -> usize {
        let listeners: Vec<Listener> = match self.by_channel.get(channel) {
            Some(entry) => entry.value().clone(),
            None => return 0,
        };
        for listener in &listeners {
            listener(args);
        }
        listeners.len()
    }

    pub fn count(&self, channel: &str) -> usize {
        self.by_channel.get(channel).map(|e| e.len()).unwrap_or(0)
    }

    pub fn clear(&self) {
        self.by_channel.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.by_channel.is_empty()
    }
}

/// Un handler por canal para responder `invoke`.
#[derive(Default)]
pub struct HandlerRegistry {
    by_channel: DashMap<String, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Falla con `HandlerExists` si el canal ya tiene handler.
    pub fn register(&self, channel: &str, handler: Handler) -> Result<(), BridgeError> {
        match self.by_channel.entry(channel.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(BridgeError::HandlerExists(channel.to_string())),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(handler);
                Ok(())
            }
        }
    }

    pub fn get(&self, channel: &str) -> Option<Handler> {
        self.by_channel.get(channel).map(|h| h.value().clone())
    }

    pub fn clear(&self) {
        self.by_channel.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.by_channel.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn fire_reaches_every_listener_in_order() {
        let reg = ListenerRegistry::new();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let seen = seen.clone();
            reg.register("x", Arc::new(move |args: &[Value]| seen.lock().unwrap().push((tag, args.to_vec()))));
        }
        assert_eq!(reg.fire("x", &[json!({"a": 1})]), 2);
        assert_eq!(reg.fire("other", &[]), 0);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.iter().map(|(t, _)| *t).collect::<Vec<_>>(), vec!["first", "second"]);
        assert!(seen.iter().all(|(_, a)| a == &vec![json!({"a": 1})]));
    }

    #[test]
    fn listener_may_register_another_while_firing() {
        let reg = Arc::new(ListenerRegistry::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let (r, h) = (reg.clone(), hits.clone());
        reg.register("x",
                     Arc::new(move |_: &[Value]| {
                         h.fetch_add(1, Ordering::SeqCst);
                         let h2 = h.clone();
                         r.register("x", Arc::new(move |_: &[Value]| {
                             h2.fetch_add(10, Ordering::SeqCst);
                         }));
                     }));
        assert_eq!(reg.fire("x", &[]), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(reg.count("x"), 2);
    }

    #[test]
    fn second_handler_on_same_channel_is_rejected() {
        let reg = HandlerRegistry::new();
        let handler: Handler = Arc::new(|args: Vec<Value>| async move { Ok(Value::Array(args)) }.boxed());
        reg.register("y", handler.clone()).unwrap();
        assert_eq!(reg.register("y", handler), Err(BridgeError::HandlerExists("y".into())));
        reg.clear();
        assert!(reg.is_empty());
    }
}
