//! Wire value model shared by all transport backends

use crate::error::TransportError;

/// A single call argument, reply value, or signal payload.
///
/// The service only ever exchanges scalars: display states travel as
/// strings, power-save and inactivity flags as booleans, radio states
/// as a 32-bit bitmask. `Unit` covers empty replies from fire-and-forget
/// acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Bool(bool),
    U32(u32),
    Unit,
}

impl Value {
    /// Extract a string, or report what was actually there.
    pub fn as_text(&self) -> Result<&str, TransportError> {
        match self {
            Value::Text(s) => Ok(s),
            other => Err(TransportError::InvalidReply {
                expected: "string".into(),
                actual: other.type_name().into(),
            }),
        }
    }

    /// Extract a boolean, or report what was actually there.
    pub fn as_bool(&self) -> Result<bool, TransportError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(TransportError::InvalidReply {
                expected: "bool".into(),
                actual: other.type_name().into(),
            }),
        }
    }

    /// Extract a 32-bit unsigned integer, or report what was actually there.
    pub fn as_u32(&self) -> Result<u32, TransportError> {
        match self {
            Value::U32(v) => Ok(*v),
            other => Err(TransportError::InvalidReply {
                expected: "u32".into(),
                actual: other.type_name().into(),
            }),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "string",
            Value::Bool(_) => "bool",
            Value::U32(_) => "u32",
            Value::Unit => "unit",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

/// An incoming change signal from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalEvent {
    /// Signal member name (e.g. `protocol::DISPLAY_SIG`)
    pub signal: String,
    /// First (and only) signal argument
    pub value: Value,
}

impl SignalEvent {
    pub fn new(signal: impl Into<String>, value: Value) -> Self {
        Self {
            signal: signal.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_extractors_match() {
        assert_eq!(Value::from("on").as_text().unwrap(), "on");
        assert!(Value::from(true).as_bool().unwrap());
        assert_eq!(Value::from(7u32).as_u32().unwrap(), 7);
    }

    #[test]
    fn typed_extractors_report_mismatch() {
        let err = Value::from(true).as_text().unwrap_err();
        match err {
            TransportError::InvalidReply { expected, actual } => {
                assert_eq!(expected, "string");
                assert_eq!(actual, "bool");
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(Value::Unit.as_bool().is_err());
        assert!(Value::from("x").as_u32().is_err());
    }
}
