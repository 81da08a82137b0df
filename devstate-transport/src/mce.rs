//! D-Bus system-bus backend
//!
//! Talks to the mode-control service over zbus. Method calls go through
//! [`Transport::request`]/[`Transport::send`]; signal subscriptions install
//! a server-side match rule and forward matching messages onto the shared
//! broadcast stream from a per-signal reader task.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::protocol;
use crate::types::{SignalEvent, Value};
use crate::Transport;

/// Upper bound on any single bus call. Keeps callers from stalling on a
/// wedged service; the bus's own timeout is far longer.
const CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Broadcast capacity for incoming signals
const EVENT_CAPACITY: usize = 64;

/// Run a bus operation under [`CALL_TIMEOUT`].
///
/// Every external call goes through this, including the match-rule
/// installation in `subscribe`; a wedged service surfaces as `Timeout`
/// instead of stalling the caller indefinitely.
async fn bounded<T>(fut: impl Future<Output = zbus::Result<T>>) -> Result<T, TransportError> {
    match tokio::time::timeout(CALL_TIMEOUT, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(TransportError::Timeout),
    }
}

pub struct MceTransport {
    conn: zbus::Connection,
    events: broadcast::Sender<SignalEvent>,
    watches: Mutex<HashMap<String, tokio::task::JoinHandle<()>>>,
}

impl MceTransport {
    /// Connect to the service on the system bus.
    pub async fn system() -> Result<Self, TransportError> {
        let conn = zbus::Connection::system().await?;
        Ok(Self::with_connection(conn))
    }

    /// Wrap an existing bus connection (session bus in test setups).
    pub fn with_connection(conn: zbus::Connection) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            conn,
            events,
            watches: Mutex::new(HashMap::new()),
        }
    }

    async fn call_raw(
        &self,
        method: &str,
        args: &[Value],
    ) -> Result<zbus::message::Message, TransportError> {
        let dest = Some(protocol::MCE_SERVICE);
        let path = protocol::MCE_REQUEST_PATH;
        let iface = Some(protocol::MCE_REQUEST_IF);

        bounded(async {
            match args {
                [] => self.conn.call_method(dest, path, iface, method, &()).await,
                [Value::Text(s)] => {
                    self.conn
                        .call_method(dest, path, iface, method, &s.as_str())
                        .await
                }
                [Value::Bool(b)] => self.conn.call_method(dest, path, iface, method, b).await,
                [Value::U32(v)] => self.conn.call_method(dest, path, iface, method, v).await,
                [Value::U32(a), Value::U32(b)] => {
                    self.conn
                        .call_method(dest, path, iface, method, &(*a, *b))
                        .await
                }
                _ => Err(zbus::Error::Unsupported),
            }
        })
        .await
    }
}

#[async_trait]
impl Transport for MceTransport {
    async fn request(&self, method: &str, args: &[Value]) -> Result<Value, TransportError> {
        let reply = self.call_raw(method, args).await?;
        decode_body(&reply)
    }

    async fn send(&self, method: &str, args: &[Value]) -> Result<(), TransportError> {
        let builder = zbus::message::Message::method_call(protocol::MCE_REQUEST_PATH, method)?
            .destination(protocol::MCE_SERVICE)?
            .interface(protocol::MCE_REQUEST_IF)?
            .with_flags(zbus::message::Flags::NoReplyExpected)?;

        let msg = match args {
            [] => builder.build(&())?,
            [Value::Text(s)] => builder.build(&s.as_str())?,
            [Value::Bool(b)] => builder.build(b)?,
            [Value::U32(v)] => builder.build(v)?,
            [Value::U32(a), Value::U32(b)] => builder.build(&(*a, *b))?,
            _ => {
                return Err(TransportError::Internal(format!(
                    "unsupported argument shape for {method}"
                )))
            }
        };

        self.conn.send(&msg).await?;
        Ok(())
    }

    async fn subscribe(&self, signal: &str) -> Result<(), TransportError> {
        let rule = zbus::MatchRule::builder()
            .msg_type(zbus::message::Type::Signal)
            .sender(protocol::MCE_SERVICE)?
            .path(protocol::MCE_SIGNAL_PATH)?
            .interface(protocol::MCE_SIGNAL_IF)?
            .member(signal)?
            .build();

        let mut stream = bounded(zbus::MessageStream::for_match_rule(
            rule,
            &self.conn,
            Some(EVENT_CAPACITY),
        ))
        .await?;

        let tx = self.events.clone();
        let name = signal.to_string();
        let task_name = name.clone();
        let task = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                let Ok(msg) = msg else { continue };
                let header = msg.header();
                let Some(member) = header.member().map(|m| m.to_string()) else {
                    continue;
                };
                match decode_body(&msg) {
                    Ok(value) => {
                        // Ignore send errors: no receivers just means
                        // nobody is watching right now.
                        let _ = tx.send(SignalEvent::new(member, value));
                    }
                    Err(e) => {
                        debug!(signal = %task_name, "undecodable signal payload: {e}");
                    }
                }
            }
        });

        debug!(signal = %name, "subscribed");
        let mut watches = self.watches.lock();
        if let Some(old) = watches.insert(name, task) {
            old.abort();
        }
        Ok(())
    }

    async fn unsubscribe(&self, signal: &str) -> Result<(), TransportError> {
        let task = self.watches.lock().remove(signal);
        match task {
            Some(task) => {
                // Aborting drops the message stream, which removes the
                // match rule on the bus.
                task.abort();
                debug!(signal = %signal, "unsubscribed");
                Ok(())
            }
            None => {
                warn!(signal = %signal, "unsubscribe without active subscription");
                Ok(())
            }
        }
    }

    fn signal_events(&self) -> broadcast::Receiver<SignalEvent> {
        self.events.subscribe()
    }

    async fn service_available(&self) -> bool {
        let Ok(proxy) = zbus::fdo::DBusProxy::new(&self.conn).await else {
            return false;
        };
        let Ok(name) = zbus::names::BusName::try_from(protocol::MCE_SERVICE) else {
            return false;
        };
        proxy.name_has_owner(name).await.unwrap_or(false)
    }
}

impl Drop for MceTransport {
    fn drop(&mut self) {
        for (_, task) in self.watches.lock().drain() {
            task.abort();
        }
    }
}

/// Decode a scalar message body into a [`Value`].
fn decode_body(msg: &zbus::message::Message) -> Result<Value, TransportError> {
    let body = msg.body();
    let sig = body.signature().to_string();
    match sig.as_str() {
        "" => Ok(Value::Unit),
        "s" => Ok(Value::Text(body.deserialize()?)),
        "b" => Ok(Value::Bool(body.deserialize()?)),
        "u" => Ok(Value::U32(body.deserialize()?)),
        other => Err(TransportError::InvalidReply {
            expected: "scalar".into(),
            actual: format!("signature \"{other}\""),
        }),
    }
}
