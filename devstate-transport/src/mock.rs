//! Scripted transport for tests
//!
//! Records every call, serves canned replies, and lets tests inject
//! signal events as if the service had emitted them.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::TransportError;
use crate::types::{SignalEvent, Value};
use crate::Transport;

/// One recorded transport operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Request(String),
    Send(String),
    Subscribe(String),
    Unsubscribe(String),
}

#[derive(Default)]
struct MockState {
    replies: HashMap<String, Value>,
    fail_requests: bool,
    fail_subscribe: bool,
    fail_unsubscribe: bool,
    log: Vec<MockCall>,
}

pub struct MockTransport {
    state: Mutex<MockState>,
    events: broadcast::Sender<SignalEvent>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(MockState::default()),
            events,
        }
    }

    /// Script the reply for a method.
    pub fn set_reply(&self, method: &str, value: Value) {
        self.state.lock().replies.insert(method.to_string(), value);
    }

    /// Make all `request`/`send` calls fail with `ServiceUnavailable`.
    pub fn fail_requests(&self, fail: bool) {
        self.state.lock().fail_requests = fail;
    }

    /// Make `subscribe` calls fail with `ServiceUnavailable`.
    pub fn fail_subscribe(&self, fail: bool) {
        self.state.lock().fail_subscribe = fail;
    }

    /// Make `unsubscribe` calls fail with `ServiceUnavailable`.
    pub fn fail_unsubscribe(&self, fail: bool) {
        self.state.lock().fail_unsubscribe = fail;
    }

    /// Inject a signal event, as if the service had emitted it.
    ///
    /// Returns the number of broadcast receivers it reached.
    pub fn emit(&self, signal: &str, value: Value) -> usize {
        self.events
            .send(SignalEvent::new(signal, value))
            .unwrap_or(0)
    }

    /// Everything that has been called on this transport, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().log.clone()
    }

    pub fn subscribe_count(&self, signal: &str) -> usize {
        self.count(|c| matches!(c, MockCall::Subscribe(s) if s == signal))
    }

    pub fn unsubscribe_count(&self, signal: &str) -> usize {
        self.count(|c| matches!(c, MockCall::Unsubscribe(s) if s == signal))
    }

    pub fn request_count(&self, method: &str) -> usize {
        self.count(|c| matches!(c, MockCall::Request(m) if m == method))
    }

    pub fn send_count(&self, method: &str) -> usize {
        self.count(|c| matches!(c, MockCall::Send(m) if m == method))
    }

    fn count(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.state.lock().log.iter().filter(|c| pred(c)).count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, method: &str, _args: &[Value]) -> Result<Value, TransportError> {
        let mut state = self.state.lock();
        state.log.push(MockCall::Request(method.to_string()));
        if state.fail_requests {
            return Err(TransportError::ServiceUnavailable("mock failure".into()));
        }
        state.replies.get(method).cloned().ok_or_else(|| {
            TransportError::ServiceUnavailable(format!("no reply scripted for {method}"))
        })
    }

    async fn send(&self, method: &str, _args: &[Value]) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.log.push(MockCall::Send(method.to_string()));
        if state.fail_requests {
            return Err(TransportError::ServiceUnavailable("mock failure".into()));
        }
        Ok(())
    }

    async fn subscribe(&self, signal: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.log.push(MockCall::Subscribe(signal.to_string()));
        if state.fail_subscribe {
            return Err(TransportError::ServiceUnavailable("mock failure".into()));
        }
        Ok(())
    }

    async fn unsubscribe(&self, signal: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.log.push(MockCall::Unsubscribe(signal.to_string()));
        if state.fail_unsubscribe {
            return Err(TransportError::ServiceUnavailable("mock failure".into()));
        }
        Ok(())
    }

    fn signal_events(&self) -> broadcast::Receiver<SignalEvent> {
        self.events.subscribe()
    }

    async fn service_available(&self) -> bool {
        !self.state.lock().fail_requests
    }
}
