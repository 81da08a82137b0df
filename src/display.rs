//! Display state and display settings
//!
//! State requests go to the service over the transport; brightness and
//! timeout settings live in the settings store.

use std::sync::Arc;

use tracing::debug;

use crate::error::StateError;
use crate::settings::{keys, SettingsStore};
use devstate_transport::{protocol, Transport, Value};

/// Current display state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayState {
    On,
    Dimmed,
    Off,
    /// State could not be determined
    #[default]
    Unknown,
}

impl DisplayState {
    /// Translate the service's raw status string.
    pub fn from_mce(raw: &str) -> Self {
        match raw {
            protocol::DISPLAY_ON_STRING => DisplayState::On,
            protocol::DISPLAY_DIM_STRING => DisplayState::Dimmed,
            protocol::DISPLAY_OFF_STRING => DisplayState::Off,
            _ => DisplayState::Unknown,
        }
    }

    fn request_method(self) -> Option<&'static str> {
        match self {
            DisplayState::On => Some(protocol::DISPLAY_ON_REQ),
            DisplayState::Dimmed => Some(protocol::DISPLAY_DIM_REQ),
            DisplayState::Off => Some(protocol::DISPLAY_OFF_REQ),
            DisplayState::Unknown => None,
        }
    }
}

impl std::fmt::Display for DisplayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DisplayState::On => "on",
            DisplayState::Dimmed => "dimmed",
            DisplayState::Off => "off",
            DisplayState::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// High-level display interface using any transport
pub struct DisplayControl {
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
}

impl DisplayControl {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn SettingsStore>) -> Self {
        Self { transport, store }
    }

    /// Fetch the current display state.
    ///
    /// Returns [`DisplayState::Unknown`] when the service is unreachable
    /// or replies with something unexpected.
    pub async fn get(&self) -> DisplayState {
        match self.transport.request(protocol::DISPLAY_STATUS_GET, &[]).await {
            Ok(Value::Text(s)) => DisplayState::from_mce(&s),
            Ok(other) => {
                debug!("unexpected display status reply: {other:?}");
                DisplayState::Unknown
            }
            Err(e) => {
                debug!("display status query failed: {e}");
                DisplayState::Unknown
            }
        }
    }

    /// Request a display state change. Fire-and-forget; the service
    /// confirms via the display status signal.
    pub async fn set(&self, state: DisplayState) -> Result<(), StateError> {
        let method = state.request_method().ok_or_else(|| {
            StateError::InvalidArgument("cannot request the unknown display state".into())
        })?;
        self.transport.send(method, &[]).await?;
        Ok(())
    }

    /// Keep the display from blanking until cancelled or renewed.
    pub async fn blanking_pause(&self) -> Result<(), StateError> {
        self.transport
            .send(protocol::PREVENT_BLANK_REQ, &[])
            .await?;
        Ok(())
    }

    /// Let the display blank normally again.
    pub async fn cancel_blanking_pause(&self) -> Result<(), StateError> {
        self.transport
            .send(protocol::CANCEL_PREVENT_BLANK_REQ, &[])
            .await?;
        Ok(())
    }

    // === Settings ===

    /// Current brightness level.
    pub fn brightness(&self) -> Result<i64, StateError> {
        Ok(self.store.get_int(keys::BRIGHTNESS)?)
    }

    /// Highest valid brightness level.
    pub fn max_brightness(&self) -> Result<i64, StateError> {
        Ok(self.store.get_int(keys::MAX_BRIGHTNESS)?)
    }

    /// Set brightness; valid range is 1..=max.
    pub fn set_brightness(&self, level: i64) -> Result<(), StateError> {
        let max = self.max_brightness()?;
        if level < 1 || level > max {
            return Err(StateError::InvalidArgument(format!(
                "brightness {level} out of range 1..={max}"
            )));
        }
        Ok(self.store.set_int(keys::BRIGHTNESS, level)?)
    }

    /// Seconds of idle time before the display blanks.
    pub fn blank_timeout(&self) -> Result<i64, StateError> {
        Ok(self.store.get_int(keys::BLANK_TIMEOUT)?)
    }

    pub fn set_blank_timeout(&self, seconds: i64) -> Result<(), StateError> {
        if seconds < 0 {
            return Err(StateError::InvalidArgument(
                "blank timeout must be non-negative".into(),
            ));
        }
        Ok(self.store.set_int(keys::BLANK_TIMEOUT, seconds)?)
    }

    /// Seconds of idle time before the display dims.
    pub fn dim_timeout(&self) -> Result<i64, StateError> {
        Ok(self.store.get_int(keys::DIM_TIMEOUT)?)
    }

    /// Set the dim timeout. Only values from the configured
    /// possible-timeouts list are accepted.
    pub fn set_dim_timeout(&self, seconds: i64) -> Result<(), StateError> {
        let possible = self.store.get_int_list(keys::POSSIBLE_DIM_TIMEOUTS)?;
        if !possible.contains(&seconds) {
            return Err(StateError::InvalidArgument(format!(
                "dim timeout {seconds} not in {possible:?}"
            )));
        }
        Ok(self.store.set_int(keys::DIM_TIMEOUT, seconds)?)
    }

    /// Whether the display is allowed to blank while charging.
    ///
    /// The store holds an inhibit value, so zero means blanking is
    /// allowed.
    pub fn blanking_when_charging(&self) -> Result<bool, StateError> {
        Ok(self.store.get_int(keys::INHIBIT_BLANK_CHARGING)? == 0)
    }

    pub fn set_blanking_when_charging(&self, blanking: bool) -> Result<(), StateError> {
        let inhibit = if blanking { 0 } else { 1 };
        Ok(self.store.set_int(keys::INHIBIT_BLANK_CHARGING, inhibit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryStore;
    use devstate_transport::MockTransport;

    fn control(mock: Arc<MockTransport>) -> DisplayControl {
        DisplayControl::new(mock, Arc::new(MemoryStore::with_defaults()))
    }

    #[tokio::test]
    async fn set_requests_map_to_methods() {
        let mock = Arc::new(MockTransport::new());
        let display = control(Arc::clone(&mock));

        display.set(DisplayState::Off).await.unwrap();
        display.set(DisplayState::Dimmed).await.unwrap();
        display.set(DisplayState::On).await.unwrap();

        assert_eq!(mock.send_count(protocol::DISPLAY_OFF_REQ), 1);
        assert_eq!(mock.send_count(protocol::DISPLAY_DIM_REQ), 1);
        assert_eq!(mock.send_count(protocol::DISPLAY_ON_REQ), 1);
    }

    #[tokio::test]
    async fn setting_unknown_state_is_rejected() {
        let mock = Arc::new(MockTransport::new());
        let display = control(Arc::clone(&mock));

        let err = display.set(DisplayState::Unknown).await.unwrap_err();
        assert!(matches!(err, StateError::InvalidArgument(_)));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn brightness_range_is_enforced() {
        let display = control(Arc::new(MockTransport::new()));

        display.set_brightness(5).unwrap();
        assert_eq!(display.brightness().unwrap(), 5);

        assert!(display.set_brightness(0).is_err());
        assert!(display.set_brightness(6).is_err());
        // Rejected writes leave the stored value alone.
        assert_eq!(display.brightness().unwrap(), 5);
    }

    #[test]
    fn dim_timeout_must_be_a_listed_value() {
        let display = control(Arc::new(MockTransport::new()));

        display.set_dim_timeout(120).unwrap();
        assert_eq!(display.dim_timeout().unwrap(), 120);

        assert!(matches!(
            display.set_dim_timeout(45),
            Err(StateError::InvalidArgument(_))
        ));
        assert_eq!(display.dim_timeout().unwrap(), 120);
    }

    #[test]
    fn blanking_when_charging_is_stored_inverted() {
        let display = control(Arc::new(MockTransport::new()));

        assert!(display.blanking_when_charging().unwrap());
        display.set_blanking_when_charging(false).unwrap();
        assert!(!display.blanking_when_charging().unwrap());
    }
}
