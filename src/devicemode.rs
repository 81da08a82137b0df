//! Device mode (radio) and power-save state
//!
//! Device mode is derived from the service's radio state bitmask; the
//! forced/automatic power-save settings persist in the settings store.

use std::sync::Arc;

use tracing::debug;

use crate::error::StateError;
use crate::settings::{keys, SettingsStore};
use devstate_transport::{protocol, Transport, Value};

/// Radio mode of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceMode {
    /// Master radio on
    Normal,
    /// Master radio off (flight mode)
    Flight,
    /// Mode could not be determined
    #[default]
    Unknown,
}

impl DeviceMode {
    /// Derive the mode from the radio state bitmask.
    pub fn from_radio_states(bits: u32) -> Self {
        if bits & protocol::RADIO_STATE_MASTER != 0 {
            DeviceMode::Normal
        } else {
            DeviceMode::Flight
        }
    }
}

impl std::fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeviceMode::Normal => "normal",
            DeviceMode::Flight => "flight",
            DeviceMode::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Power-save mode state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PsmState {
    On,
    Off,
    /// State could not be determined
    #[default]
    Unknown,
}

impl PsmState {
    pub fn from_flag(on: bool) -> Self {
        if on {
            PsmState::On
        } else {
            PsmState::Off
        }
    }
}

impl std::fmt::Display for PsmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PsmState::On => "on",
            PsmState::Off => "off",
            PsmState::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// High-level device-mode interface using any transport
pub struct DeviceModeControl {
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
}

impl DeviceModeControl {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn SettingsStore>) -> Self {
        Self { transport, store }
    }

    /// Fetch the current device mode.
    ///
    /// Returns [`DeviceMode::Unknown`] when the service is unreachable or
    /// replies with something unexpected.
    pub async fn mode(&self) -> DeviceMode {
        match self.transport.request(protocol::RADIO_STATES_GET, &[]).await {
            Ok(Value::U32(bits)) => DeviceMode::from_radio_states(bits),
            Ok(other) => {
                debug!("unexpected radio states reply: {other:?}");
                DeviceMode::Unknown
            }
            Err(e) => {
                debug!("radio states query failed: {e}");
                DeviceMode::Unknown
            }
        }
    }

    /// Request a device mode change. Fire-and-forget; the service
    /// confirms via the radio states signal.
    pub async fn set_mode(&self, mode: DeviceMode) -> Result<(), StateError> {
        let state: u32 = match mode {
            DeviceMode::Normal => 1,
            DeviceMode::Flight => 0,
            DeviceMode::Unknown => {
                return Err(StateError::InvalidArgument(
                    "cannot request the unknown device mode".into(),
                ))
            }
        };
        self.transport
            .send(
                protocol::RADIO_STATES_CHANGE_REQ,
                &[Value::U32(state), Value::U32(protocol::RADIO_STATE_MASTER)],
            )
            .await?;
        Ok(())
    }

    /// Fetch the current power-save state.
    pub async fn psm_state(&self) -> PsmState {
        match self.transport.request(protocol::PSM_STATE_GET, &[]).await {
            Ok(Value::Bool(on)) => PsmState::from_flag(on),
            Ok(other) => {
                debug!("unexpected power-save reply: {other:?}");
                PsmState::Unknown
            }
            Err(e) => {
                debug!("power-save query failed: {e}");
                PsmState::Unknown
            }
        }
    }

    /// Force power-save mode on or off via the settings store.
    pub fn set_psm_state(&self, state: PsmState) -> Result<(), StateError> {
        let force = match state {
            PsmState::On => true,
            PsmState::Off => false,
            PsmState::Unknown => {
                return Err(StateError::InvalidArgument(
                    "cannot request the unknown power-save state".into(),
                ))
            }
        };
        Ok(self.store.set_bool(keys::PSM_FORCE, force)?)
    }

    /// Battery percentage at which automatic power-save mode kicks in,
    /// or 0 when automatic power-save mode is disabled.
    pub fn psm_battery_mode(&self) -> Result<i64, StateError> {
        if !self.store.get_bool(keys::PSM_AUTO)? {
            return Ok(0);
        }
        Ok(self.store.get_int(keys::PSM_THRESHOLD)?)
    }

    /// Configure automatic power-save mode.
    ///
    /// 0 disables it; 1..=100 enables it at the first configured threshold
    /// at or above the requested percentage (the highest threshold when
    /// the request exceeds them all).
    pub fn set_psm_battery_mode(&self, percentage: i64) -> Result<(), StateError> {
        if !(0..=100).contains(&percentage) {
            return Err(StateError::InvalidArgument(format!(
                "battery percentage {percentage} out of range 0..=100"
            )));
        }

        if percentage == 0 {
            return Ok(self.store.set_bool(keys::PSM_AUTO, false)?);
        }

        let thresholds = self.store.get_int_list(keys::PSM_THRESHOLDS)?;
        let snapped = thresholds
            .iter()
            .copied()
            .find(|&t| percentage <= t)
            .or_else(|| thresholds.last().copied())
            .ok_or_else(|| {
                StateError::InvalidArgument("no power-save thresholds configured".into())
            })?;

        self.store.set_bool(keys::PSM_AUTO, true)?;
        Ok(self.store.set_int(keys::PSM_THRESHOLD, snapped)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryStore;
    use devstate_transport::MockTransport;

    fn control(mock: Arc<MockTransport>) -> DeviceModeControl {
        DeviceModeControl::new(mock, Arc::new(MemoryStore::with_defaults()))
    }

    #[tokio::test]
    async fn mode_change_targets_master_radio() {
        let mock = Arc::new(MockTransport::new());
        let modes = control(Arc::clone(&mock));

        modes.set_mode(DeviceMode::Flight).await.unwrap();
        modes.set_mode(DeviceMode::Normal).await.unwrap();
        assert_eq!(mock.send_count(protocol::RADIO_STATES_CHANGE_REQ), 2);

        let err = modes.set_mode(DeviceMode::Unknown).await.unwrap_err();
        assert!(matches!(err, StateError::InvalidArgument(_)));
    }

    #[test]
    fn psm_battery_mode_snaps_to_thresholds() {
        let modes = control(Arc::new(MockTransport::new()));

        // 15% snaps up to the 20% threshold.
        modes.set_psm_battery_mode(15).unwrap();
        assert_eq!(modes.psm_battery_mode().unwrap(), 20);

        // Above every threshold: highest one wins.
        modes.set_psm_battery_mode(85).unwrap();
        assert_eq!(modes.psm_battery_mode().unwrap(), 50);

        // Exact match stays put.
        modes.set_psm_battery_mode(30).unwrap();
        assert_eq!(modes.psm_battery_mode().unwrap(), 30);

        // Zero disables automatic power-save mode.
        modes.set_psm_battery_mode(0).unwrap();
        assert_eq!(modes.psm_battery_mode().unwrap(), 0);

        assert!(modes.set_psm_battery_mode(101).is_err());
        assert!(modes.set_psm_battery_mode(-1).is_err());
    }

    #[test]
    fn forced_psm_is_persisted() {
        let store = Arc::new(MemoryStore::with_defaults());
        let modes = DeviceModeControl::new(Arc::new(MockTransport::new()), Arc::clone(&store) as Arc<dyn SettingsStore>);

        modes.set_psm_state(PsmState::On).unwrap();
        assert!(store.get_bool(keys::PSM_FORCE).unwrap());

        modes.set_psm_state(PsmState::Off).unwrap();
        assert!(!store.get_bool(keys::PSM_FORCE).unwrap());

        assert!(modes.set_psm_state(PsmState::Unknown).is_err());
    }
}
