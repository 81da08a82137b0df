//! Crate-level error type

use thiserror::Error;

use crate::settings::StoreError;
use devstate_transport::TransportError;

/// Errors surfaced by the high-level state interfaces
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Settings store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
