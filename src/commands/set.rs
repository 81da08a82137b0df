//! Set command handlers

use std::sync::Arc;

use devstate::{
    DeviceMode, DeviceModeControl, DisplayControl, DisplayState, PsmState, SettingsStore,
    StateError,
};
use devstate_transport::Transport;

pub async fn set_display(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
    state: DisplayState,
) -> Result<(), StateError> {
    DisplayControl::new(transport, store).set(state).await?;
    println!("Requested display {state}");
    Ok(())
}

pub async fn set_mode(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
    mode: DeviceMode,
) -> Result<(), StateError> {
    DeviceModeControl::new(transport, store)
        .set_mode(mode)
        .await?;
    println!("Requested {mode} mode");
    Ok(())
}

pub fn set_psm(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
    state: PsmState,
) -> Result<(), StateError> {
    DeviceModeControl::new(transport, store).set_psm_state(state)?;
    println!("Power-save mode forced {state}");
    Ok(())
}

pub fn set_psm_battery(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
    percent: i64,
) -> Result<(), StateError> {
    let modes = DeviceModeControl::new(transport, store);
    modes.set_psm_battery_mode(percent)?;
    match modes.psm_battery_mode()? {
        0 => println!("Automatic power-save disabled"),
        threshold => println!("Automatic power-save at {threshold}% battery"),
    }
    Ok(())
}

pub fn set_brightness(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
    level: i64,
) -> Result<(), StateError> {
    DisplayControl::new(transport, store).set_brightness(level)?;
    println!("Brightness set to {level}");
    Ok(())
}

pub fn set_blank_timeout(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
    seconds: i64,
) -> Result<(), StateError> {
    DisplayControl::new(transport, store).set_blank_timeout(seconds)?;
    println!("Blank timeout set to {seconds}s");
    Ok(())
}

pub fn set_dim_timeout(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
    seconds: i64,
) -> Result<(), StateError> {
    DisplayControl::new(transport, store).set_dim_timeout(seconds)?;
    println!("Dim timeout set to {seconds}s");
    Ok(())
}

pub async fn blanking_pause(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
) -> Result<(), StateError> {
    DisplayControl::new(transport, store).blanking_pause().await?;
    println!("Blanking paused");
    Ok(())
}

pub async fn blanking_resume(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
) -> Result<(), StateError> {
    DisplayControl::new(transport, store)
        .cancel_blanking_pause()
        .await?;
    println!("Blanking resumed");
    Ok(())
}
