//! Capa tipada sobre la superficie posicional.
//!
//! Un `ChannelContract` fija, en tiempo de compilación, el nombre del canal y
//! los tipos de request/response. En el cable viaja igual que la forma
//! posicional: el request es el primer argumento.
//!
//! ```ignore
//! pot_bridge::channel!(pub Ping: "app:ping" => PingRequest => PingResponse);
//! let pong = bridge.invoke_typed::<Ping>(&PingRequest { .. }).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::bridge::Bridge;
use crate::errors::BridgeError;

pub trait ChannelContract: 'static {
    const CHANNEL: &'static str;
    type Request: Serialize + DeserializeOwned + Send + Sync + 'static;
    type Response: Serialize + DeserializeOwned + Send + Sync + 'static;
}

/// Declara un contrato de canal.
///
/// Formas soportadas:
/// - channel!(pub Name: "canal" => Request => Response);
/// - channel!(pub Name: "canal" => Request); // Response = ()
#[macro_export]
macro_rules! channel {
    ($(#[$meta:meta])* $vis:vis $name:ident : $chan:literal => $req:ty => $resp:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;
        impl $crate::typed::ChannelContract for $name {
            const CHANNEL: &'static str = $chan;
            type Request = $req;
            type Response = $resp;
        }
    };
    ($(#[$meta:meta])* $vis:vis $name:ident : $chan:literal => $req:ty) => {
        $crate::channel!($(#[$meta])* $vis $name : $chan => $req => ());
    };
}

fn decode_first<T: DeserializeOwned>(channel: &str, args: &[Value]) -> Result<T, BridgeError> {
    let first = args.first().cloned().unwrap_or(Value::Null);
    serde_json::from_value(first).map_err(|e| BridgeError::Payload { channel: channel.to_string(),
                                                                     reason: e.to_string() })
}

impl Bridge {
    pub fn send_typed<C: ChannelContract>(&self, request: &C::Request) {
        match serde_json::to_value(request) {
            Ok(v) => self.send(C::CHANNEL, v),
            Err(e) => warn!("send_typed '{}': encode failed, dropped: {e}", C::CHANNEL),
        }
    }

    /// Los mensajes que no decodifican al `Request` del contrato se registran
    /// y se descartan.
    pub fn receive_typed<C, F>(&self, callback: F)
        where C: ChannelContract,
              F: Fn(C::Request) + Send + Sync + 'static
    {
        self.receive(C::CHANNEL, move |args: &[Value]| match decode_first::<C::Request>(C::CHANNEL, args) {
                Ok(req) => callback(req),
                Err(e) => warn!("receive_typed: {e}"),
            });
    }

    pub async fn invoke_typed<C: ChannelContract>(&self, request: &C::Request) -> Result<C::Response, BridgeError> {
        let arg = serde_json::to_value(request)?;
        let value = self.invoke(C::CHANNEL, vec![arg]).await?;
        serde_json::from_value(value).map_err(|e| BridgeError::Payload { channel: C::CHANNEL.to_string(),
                                                                         reason: e.to_string() })
    }

    pub fn handle_typed<C, F, Fut>(&self, handler: F) -> Result<(), BridgeError>
        where C: ChannelContract,
              F: Fn(C::Request) -> Fut + Send + Sync + 'static,
              Fut: Future<Output = Result<C::Response, String>> + Send + 'static
    {
        let handler = Arc::new(handler);
        self.handle(C::CHANNEL, move |args: Vec<Value>| {
                let handler = handler.clone();
                async move {
                    let request = decode_first::<C::Request>(C::CHANNEL, &args).map_err(|e| e.to_string())?;
                    let response = handler(request).await?;
                    serde_json::to_value(response).map_err(|e| e.to_string())
                }
            })
    }
}
