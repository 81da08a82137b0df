//! Transport error types

use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Bus disconnected")]
    Disconnected,

    #[error("Call timeout")]
    Timeout,

    #[error("Invalid reply: expected {expected}, got {actual}")]
    InvalidReply { expected: String, actual: String },

    #[error("Bus error: {0}")]
    Bus(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<zbus::Error> for TransportError {
    fn from(e: zbus::Error) -> Self {
        match e {
            zbus::Error::MethodError(ref name, _, _)
                if name.as_str().ends_with("ServiceUnknown")
                    || name.as_str().ends_with("NameHasNoOwner") =>
            {
                TransportError::ServiceUnavailable(e.to_string())
            }
            zbus::Error::InputOutput(_) => TransportError::Disconnected,
            _ => TransportError::Bus(e.to_string()),
        }
    }
}
