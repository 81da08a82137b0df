//! Transport abstraction for the MCE device-state service
//!
//! This crate provides a unified interface for talking to the system's
//! mode-control service (MCE): request/response method calls, signal
//! subscriptions, and delivery of incoming change signals.
//!
//! Backends:
//! - D-Bus system bus (the real service)
//! - Scripted mock (for tests and offline development)

pub mod error;
pub mod mce;
pub mod mock;
pub mod protocol;
pub mod types;

pub use error::TransportError;
pub use mce::MceTransport;
pub use mock::{MockCall, MockTransport};
pub use types::{SignalEvent, Value};

use async_trait::async_trait;
use tokio::sync::broadcast;

/// The core transport trait - all backends implement this
///
/// Method and signal names are plain member strings; the well-known ones
/// live in [`protocol`]. Incoming signals are fanned out on a broadcast
/// channel so any number of consumers can watch the same stream.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Call a method on the service and wait for its reply.
    ///
    /// # Arguments
    /// * `method` - Method member name (e.g. `protocol::DISPLAY_STATUS_GET`)
    /// * `args` - Call arguments, in order
    async fn request(&self, method: &str, args: &[Value]) -> Result<Value, TransportError>;

    /// Call a method without waiting for a reply (fire-and-forget).
    ///
    /// Used for state-change requests where the service acknowledges via
    /// a later signal rather than a reply value.
    async fn send(&self, method: &str, args: &[Value]) -> Result<(), TransportError>;

    /// Start receiving the named signal on the signal stream.
    ///
    /// Subscribing twice to the same signal replaces the first match.
    async fn subscribe(&self, signal: &str) -> Result<(), TransportError>;

    /// Stop receiving the named signal.
    async fn unsubscribe(&self, signal: &str) -> Result<(), TransportError>;

    /// Subscribe to incoming signals via broadcast channel.
    ///
    /// Only signals with an active [`subscribe`](Transport::subscribe)
    /// match are delivered.
    fn signal_events(&self) -> broadcast::Receiver<SignalEvent>;

    /// Check whether the service is currently reachable.
    async fn service_available(&self) -> bool;
}
