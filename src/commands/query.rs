//! Query command handlers

use std::sync::Arc;

use devstate::{
    ActivityControl, DeviceModeControl, DisplayControl, SettingsStore, StateError,
};
use devstate_transport::Transport;

/// Show all device states plus the stored display settings.
pub async fn status(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
) -> Result<(), StateError> {
    let display = DisplayControl::new(Arc::clone(&transport), Arc::clone(&store));
    let modes = DeviceModeControl::new(Arc::clone(&transport), Arc::clone(&store));
    let activity = ActivityControl::new(Arc::clone(&transport));

    println!("Display:    {}", display.get().await);
    println!("Mode:       {}", modes.mode().await);
    println!("Power-save: {}", modes.psm_state().await);
    println!("Activity:   {}", activity.get().await);

    match display.brightness() {
        Ok(level) => {
            let max = display.max_brightness().unwrap_or(level);
            println!("Brightness: {level}/{max}");
        }
        Err(e) => println!("Brightness: unavailable ({e})"),
    }
    Ok(())
}

pub async fn display(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
) -> Result<(), StateError> {
    let display = DisplayControl::new(transport, store);
    println!("{}", display.get().await);
    Ok(())
}

pub async fn mode(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
) -> Result<(), StateError> {
    let modes = DeviceModeControl::new(transport, store);
    println!("{}", modes.mode().await);
    Ok(())
}

pub async fn psm(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
) -> Result<(), StateError> {
    let modes = DeviceModeControl::new(transport, Arc::clone(&store));
    println!("{}", modes.psm_state().await);
    match modes.psm_battery_mode() {
        Ok(0) => println!("auto: disabled"),
        Ok(threshold) => println!("auto: at {threshold}% battery"),
        Err(e) => println!("auto: unavailable ({e})"),
    }
    Ok(())
}

pub async fn activity(transport: Arc<dyn Transport>) -> Result<(), StateError> {
    let activity = ActivityControl::new(transport);
    println!("{}", activity.get().await);
    Ok(())
}

/// Show the stored brightness and timeout settings.
pub fn brightness(
    transport: Arc<dyn Transport>,
    store: Arc<dyn SettingsStore>,
) -> Result<(), StateError> {
    let display = DisplayControl::new(transport, store);

    println!(
        "Brightness:    {}/{}",
        display.brightness()?,
        display.max_brightness()?
    );
    println!("Blank timeout: {}s", display.blank_timeout()?);
    println!("Dim timeout:   {}s", display.dim_timeout()?);
    println!(
        "Blank while charging: {}",
        if display.blanking_when_charging()? {
            "yes"
        } else {
            "no"
        }
    );
    Ok(())
}
