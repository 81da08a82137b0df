// CLI definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use devstate::{Category, DeviceMode, DisplayState, PsmState};

#[derive(Parser)]
#[command(name = "devstate")]
#[command(author, version, about = "Device power/display state client")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file (default: ~/.config/devstate/settings.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // === Query Commands ===
    /// Show all device states
    #[command(visible_aliases = ["all", "a"])]
    Status,

    /// Get display state (on/dimmed/off)
    #[command(visible_alias = "d")]
    Display,

    /// Get device radio mode (normal/flight)
    #[command(visible_alias = "m")]
    Mode,

    /// Get power-save mode state
    Psm,

    /// Get user activity state
    #[command(visible_alias = "act")]
    Activity,

    /// Get brightness and display timeout settings
    #[command(visible_aliases = ["bright", "b"])]
    Brightness,

    // === Set Commands ===
    /// Request a display state change
    #[command(visible_alias = "sd")]
    SetDisplay {
        /// Target state
        state: DisplayArg,
    },

    /// Set device radio mode
    #[command(visible_alias = "sm")]
    SetMode {
        /// Target mode
        mode: ModeArg,
    },

    /// Force power-save mode on or off
    SetPsm {
        /// Target state
        state: SwitchArg,
    },

    /// Configure automatic power-save mode from battery level
    SetPsmBattery {
        /// Battery percentage threshold (0 disables)
        #[arg(value_parser = clap::value_parser!(i64).range(0..=100))]
        percent: i64,
    },

    /// Set display brightness
    #[command(visible_alias = "sb")]
    SetBrightness {
        /// Brightness level (1..=max)
        level: i64,
    },

    /// Set display blank timeout
    SetBlankTimeout {
        /// Timeout in seconds
        seconds: i64,
    },

    /// Set display dim timeout (must be one of the configured values)
    SetDimTimeout {
        /// Timeout in seconds
        seconds: i64,
    },

    /// Keep the display from blanking
    BlankingPause,

    /// Allow the display to blank again
    BlankingResume,

    // === Watch ===
    /// Stream state change notifications until Ctrl+C
    #[command(visible_alias = "w")]
    Watch {
        /// Categories to watch (default: all)
        categories: Vec<CategoryArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DisplayArg {
    On,
    Dim,
    Off,
}

impl From<DisplayArg> for DisplayState {
    fn from(arg: DisplayArg) -> Self {
        match arg {
            DisplayArg::On => DisplayState::On,
            DisplayArg::Dim => DisplayState::Dimmed,
            DisplayArg::Off => DisplayState::Off,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Normal,
    Flight,
}

impl From<ModeArg> for DeviceMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Normal => DeviceMode::Normal,
            ModeArg::Flight => DeviceMode::Flight,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SwitchArg {
    On,
    Off,
}

impl From<SwitchArg> for PsmState {
    fn from(arg: SwitchArg) -> Self {
        match arg {
            SwitchArg::On => PsmState::On,
            SwitchArg::Off => PsmState::Off,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CategoryArg {
    Display,
    Mode,
    Psm,
    Activity,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Display => Category::Display,
            CategoryArg::Mode => Category::DeviceMode,
            CategoryArg::Psm => Category::PowerSave,
            CategoryArg::Activity => Category::Activity,
        }
    }
}
