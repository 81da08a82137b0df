//! Persistent settings store
//!
//! Typed key-value persistence for the display and power-save settings the
//! service itself does not own. Backed by a TOML file under the user's
//! config directory; an in-memory variant backs the tests.
//!
//! Every lookup failure is reported explicitly. There are no implicit
//! per-key defaults beyond the seeded settings file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

type Table = BTreeMap<String, toml::Value>;

/// Errors from settings reads and writes
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Parse(String),

    #[error("Missing settings key: {0}")]
    MissingKey(String),

    #[error("Wrong type for key {key}: expected {expected}")]
    WrongType { key: String, expected: &'static str },
}

/// Typed scalar/list access by key.
pub trait SettingsStore: Send + Sync {
    fn get_int(&self, key: &str) -> Result<i64, StoreError>;
    fn set_int(&self, key: &str, value: i64) -> Result<(), StoreError>;
    fn get_bool(&self, key: &str) -> Result<bool, StoreError>;
    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError>;
    fn get_int_list(&self, key: &str) -> Result<Vec<i64>, StoreError>;
}

/// Well-known settings keys
pub mod keys {
    /// Current display brightness level (1..=max)
    pub const BRIGHTNESS: &str = "display.brightness";
    /// Highest valid brightness level
    pub const MAX_BRIGHTNESS: &str = "display.max_brightness";
    /// Seconds of idle time before the display blanks
    pub const BLANK_TIMEOUT: &str = "display.blank_timeout";
    /// Seconds of idle time before the display dims
    pub const DIM_TIMEOUT: &str = "display.dim_timeout";
    /// The dim timeouts the UI may offer
    pub const POSSIBLE_DIM_TIMEOUTS: &str = "display.possible_dim_timeouts";
    /// Non-zero inhibits blanking while on charger
    pub const INHIBIT_BLANK_CHARGING: &str = "display.inhibit_blank_charging";
    /// Force power-save mode on regardless of battery level
    pub const PSM_FORCE: &str = "psm.force";
    /// Enable automatic power-save mode at a battery threshold
    pub const PSM_AUTO: &str = "psm.auto";
    /// Battery percentage that triggers automatic power-save mode
    pub const PSM_THRESHOLD: &str = "psm.threshold";
    /// The thresholds automatic power-save mode may snap to
    pub const PSM_THRESHOLDS: &str = "psm.thresholds";
}

/// Contents written when no settings file exists yet.
const DEFAULT_SETTINGS_TOML: &str = r#"# devstate settings

"display.brightness" = 3
"display.max_brightness" = 5
"display.blank_timeout" = 30
"display.dim_timeout" = 30
"display.possible_dim_timeouts" = [15, 30, 60, 120, 300]
"display.inhibit_blank_charging" = 0

"psm.force" = false
"psm.auto" = false
"psm.threshold" = 10
"psm.thresholds" = [10, 20, 30, 40, 50]
"#;

/// Default settings file location under the user's config directory.
pub fn default_settings_path() -> PathBuf {
    dirs_path().join("settings.toml")
}

fn dirs_path() -> PathBuf {
    if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(config).join("devstate")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".config/devstate")
    } else {
        PathBuf::from(".devstate")
    }
}

// Shared typed accessors over a parsed table; both store backends go
// through these so key semantics cannot drift.

fn table_get_int(table: &Table, key: &str) -> Result<i64, StoreError> {
    match table.get(key) {
        Some(toml::Value::Integer(v)) => Ok(*v),
        Some(_) => Err(StoreError::WrongType {
            key: key.to_string(),
            expected: "integer",
        }),
        None => Err(StoreError::MissingKey(key.to_string())),
    }
}

fn table_get_bool(table: &Table, key: &str) -> Result<bool, StoreError> {
    match table.get(key) {
        Some(toml::Value::Boolean(v)) => Ok(*v),
        Some(_) => Err(StoreError::WrongType {
            key: key.to_string(),
            expected: "boolean",
        }),
        None => Err(StoreError::MissingKey(key.to_string())),
    }
}

fn table_get_int_list(table: &Table, key: &str) -> Result<Vec<i64>, StoreError> {
    let values = match table.get(key) {
        Some(toml::Value::Array(values)) => values,
        Some(_) => {
            return Err(StoreError::WrongType {
                key: key.to_string(),
                expected: "integer list",
            })
        }
        None => return Err(StoreError::MissingKey(key.to_string())),
    };
    values
        .iter()
        .map(|v| match v {
            toml::Value::Integer(i) => Ok(*i),
            _ => Err(StoreError::WrongType {
                key: key.to_string(),
                expected: "integer list",
            }),
        })
        .collect()
}

fn parse_table(text: &str) -> Result<Table, StoreError> {
    text.parse::<toml::Table>()
        .map_err(|e| StoreError::Parse(e.to_string()))
        .map(|t| t.into_iter().collect())
}

/// File-backed store with write-through saves.
pub struct TomlStore {
    path: PathBuf,
    values: Mutex<Table>,
}

impl TomlStore {
    /// Load an existing settings file. A missing file yields an empty
    /// store; reads against it report `MissingKey` until values are set.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            parse_table(&std::fs::read_to_string(&path)?)?
        } else {
            Table::new()
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Load the settings file, seeding it with defaults if absent.
    pub fn open_or_init(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_SETTINGS_TOML)?;
            debug!(path = %path.display(), "seeded default settings");
        }
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, table: &Table) -> Result<(), StoreError> {
        let rendered: toml::Table = table
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let text = toml::to_string(&rendered).map_err(|e| StoreError::Parse(e.to_string()))?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    fn set_value(&self, key: &str, value: toml::Value) -> Result<(), StoreError> {
        let mut values = self.values.lock();
        let previous = values.insert(key.to_string(), value);
        if let Err(e) = self.save(&values) {
            // Keep memory and file in step: undo the insert.
            match previous {
                Some(old) => values.insert(key.to_string(), old),
                None => values.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

impl SettingsStore for TomlStore {
    fn get_int(&self, key: &str) -> Result<i64, StoreError> {
        table_get_int(&self.values.lock(), key)
    }

    fn set_int(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.set_value(key, toml::Value::Integer(value))
    }

    fn get_bool(&self, key: &str) -> Result<bool, StoreError> {
        table_get_bool(&self.values.lock(), key)
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.set_value(key, toml::Value::Boolean(value))
    }

    fn get_int_list(&self, key: &str) -> Result<Vec<i64>, StoreError> {
        table_get_int_list(&self.values.lock(), key)
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the same defaults a fresh settings file gets.
    pub fn with_defaults() -> Self {
        let values = parse_table(DEFAULT_SETTINGS_TOML).expect("default settings must parse");
        Self {
            values: Mutex::new(values),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn get_int(&self, key: &str) -> Result<i64, StoreError> {
        table_get_int(&self.values.lock(), key)
    }

    fn set_int(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.values
            .lock()
            .insert(key.to_string(), toml::Value::Integer(value));
        Ok(())
    }

    fn get_bool(&self, key: &str) -> Result<bool, StoreError> {
        table_get_bool(&self.values.lock(), key)
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.values
            .lock()
            .insert(key.to_string(), toml::Value::Boolean(value));
        Ok(())
    }

    fn get_int_list(&self, key: &str) -> Result<Vec<i64>, StoreError> {
        table_get_int_list(&self.values.lock(), key)
    }
}
