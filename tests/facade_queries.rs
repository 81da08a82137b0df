//! Integration tests for the per-domain façades over a scripted transport.

use std::sync::Arc;

use devstate::{
    Activity, ActivityControl, DeviceMode, DeviceModeControl, DisplayControl, DisplayState,
    MemoryStore, PsmState, SettingsStore,
};
use devstate_transport::{protocol, MockTransport, Transport, Value};

fn setup() -> (Arc<MockTransport>, Arc<dyn Transport>, Arc<dyn SettingsStore>) {
    let mock = Arc::new(MockTransport::new());
    let transport: Arc<dyn Transport> = Arc::clone(&mock) as Arc<dyn Transport>;
    let store: Arc<dyn SettingsStore> = Arc::new(MemoryStore::with_defaults());
    (mock, transport, store)
}

#[tokio::test]
async fn display_get_translates_status_strings() {
    let (mock, transport, store) = setup();
    let display = DisplayControl::new(transport, store);

    mock.set_reply(protocol::DISPLAY_STATUS_GET, Value::from("dimmed"));
    assert_eq!(display.get().await, DisplayState::Dimmed);

    mock.set_reply(protocol::DISPLAY_STATUS_GET, Value::from("off"));
    assert_eq!(display.get().await, DisplayState::Off);

    // Malformed reply type falls back to Unknown rather than erroring.
    mock.set_reply(protocol::DISPLAY_STATUS_GET, Value::from(1u32));
    assert_eq!(display.get().await, DisplayState::Unknown);
}

#[tokio::test]
async fn display_get_survives_transport_failure() {
    let (mock, transport, store) = setup();
    let display = DisplayControl::new(transport, store);

    mock.fail_requests(true);
    assert_eq!(display.get().await, DisplayState::Unknown);
}

#[tokio::test]
async fn blanking_pause_round_trip() {
    let (mock, transport, store) = setup();
    let display = DisplayControl::new(transport, store);

    display.blanking_pause().await.unwrap();
    display.cancel_blanking_pause().await.unwrap();

    assert_eq!(mock.send_count(protocol::PREVENT_BLANK_REQ), 1);
    assert_eq!(mock.send_count(protocol::CANCEL_PREVENT_BLANK_REQ), 1);
}

#[tokio::test]
async fn device_mode_follows_radio_bitmask() {
    let (mock, transport, store) = setup();
    let modes = DeviceModeControl::new(transport, store);

    mock.set_reply(protocol::RADIO_STATES_GET, Value::from(1u32));
    assert_eq!(modes.mode().await, DeviceMode::Normal);

    mock.set_reply(protocol::RADIO_STATES_GET, Value::from(0u32));
    assert_eq!(modes.mode().await, DeviceMode::Flight);

    mock.fail_requests(true);
    assert_eq!(modes.mode().await, DeviceMode::Unknown);
}

#[tokio::test]
async fn psm_state_follows_service_flag() {
    let (mock, transport, store) = setup();
    let modes = DeviceModeControl::new(transport, store);

    mock.set_reply(protocol::PSM_STATE_GET, Value::from(true));
    assert_eq!(modes.psm_state().await, PsmState::On);

    mock.set_reply(protocol::PSM_STATE_GET, Value::from(false));
    assert_eq!(modes.psm_state().await, PsmState::Off);

    mock.set_reply(protocol::PSM_STATE_GET, Value::from("on"));
    assert_eq!(modes.psm_state().await, PsmState::Unknown);
}

#[tokio::test]
async fn activity_follows_inactivity_flag() {
    let (mock, transport, _store) = setup();
    let activity = ActivityControl::new(transport);

    mock.set_reply(protocol::INACTIVITY_STATUS_GET, Value::from(false));
    assert_eq!(activity.get().await, Activity::Active);

    mock.set_reply(protocol::INACTIVITY_STATUS_GET, Value::from(true));
    assert_eq!(activity.get().await, Activity::Inactive);

    mock.fail_requests(true);
    assert_eq!(activity.get().await, Activity::Unknown);
}
