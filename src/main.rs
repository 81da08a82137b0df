//! devstate CLI
//!
//! Query and change device power/display states, and watch their change
//! notifications.

use std::sync::Arc;

use clap::Parser;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers (split from main.rs)
mod commands;

use devstate::settings::default_settings_path;
use devstate::{SettingsStore, TomlStore};
use devstate_transport::{MceTransport, Transport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("devstate=info".parse().unwrap()),
        )
        .init();

    let settings_path = cli.settings.unwrap_or_else(default_settings_path);
    let store: Arc<dyn SettingsStore> = Arc::new(TomlStore::open_or_init(settings_path)?);
    let transport: Arc<dyn Transport> = Arc::new(MceTransport::system().await?);

    match cli.command {
        None => {
            // Default: show device state overview
            commands::query::status(transport, store).await?;
        }

        // === Query Commands ===
        Some(Commands::Status) => {
            commands::query::status(transport, store).await?;
        }
        Some(Commands::Display) => {
            commands::query::display(transport, store).await?;
        }
        Some(Commands::Mode) => {
            commands::query::mode(transport, store).await?;
        }
        Some(Commands::Psm) => {
            commands::query::psm(transport, store).await?;
        }
        Some(Commands::Activity) => {
            commands::query::activity(transport).await?;
        }
        Some(Commands::Brightness) => {
            commands::query::brightness(transport, store)?;
        }

        // === Set Commands ===
        Some(Commands::SetDisplay { state }) => {
            commands::set::set_display(transport, store, state.into()).await?;
        }
        Some(Commands::SetMode { mode }) => {
            commands::set::set_mode(transport, store, mode.into()).await?;
        }
        Some(Commands::SetPsm { state }) => {
            commands::set::set_psm(transport, store, state.into())?;
        }
        Some(Commands::SetPsmBattery { percent }) => {
            commands::set::set_psm_battery(transport, store, percent)?;
        }
        Some(Commands::SetBrightness { level }) => {
            commands::set::set_brightness(transport, store, level)?;
        }
        Some(Commands::SetBlankTimeout { seconds }) => {
            commands::set::set_blank_timeout(transport, store, seconds)?;
        }
        Some(Commands::SetDimTimeout { seconds }) => {
            commands::set::set_dim_timeout(transport, store, seconds)?;
        }
        Some(Commands::BlankingPause) => {
            commands::set::blanking_pause(transport, store).await?;
        }
        Some(Commands::BlankingResume) => {
            commands::set::blanking_resume(transport, store).await?;
        }

        // === Watch ===
        Some(Commands::Watch { categories }) => {
            let categories = categories.into_iter().map(Into::into).collect();
            commands::watch::watch(transport, categories).await?;
        }
    }

    Ok(())
}
