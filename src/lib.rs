//! High-level device-state interface over any transport
//!
//! Typed accessors for the device's power and display states (screen
//! on/dim/off, radio flight-mode, power-save mode, user activity) plus a
//! change-notification multiplexer that lazily subscribes to the service
//! only while at least one local observer is registered.

pub mod activity;
pub mod devicemode;
pub mod display;
pub mod error;
pub mod monitor;
pub mod settings;

pub use activity::{Activity, ActivityControl};
pub use devicemode::{DeviceMode, DeviceModeControl, PsmState};
pub use display::{DisplayControl, DisplayState};
pub use error::StateError;
pub use monitor::{Category, Observer, StateChange, StateMonitor};
pub use settings::{keys, MemoryStore, SettingsStore, StoreError, TomlStore};
