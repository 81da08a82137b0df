//! User activity state

use std::sync::Arc;

use tracing::debug;

use devstate_transport::{protocol, Transport, Value};

/// User activity state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    Active,
    Inactive,
    /// State could not be determined
    #[default]
    Unknown,
}

impl Activity {
    /// The service reports inactivity, so a true flag means inactive.
    pub fn from_inactivity(inactive: bool) -> Self {
        if inactive {
            Activity::Inactive
        } else {
            Activity::Active
        }
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Activity::Active => "active",
            Activity::Inactive => "inactive",
            Activity::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// High-level activity interface using any transport
pub struct ActivityControl {
    transport: Arc<dyn Transport>,
}

impl ActivityControl {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch the current activity state.
    ///
    /// Returns [`Activity::Unknown`] when the service is unreachable or
    /// replies with something unexpected.
    pub async fn get(&self) -> Activity {
        match self
            .transport
            .request(protocol::INACTIVITY_STATUS_GET, &[])
            .await
        {
            Ok(Value::Bool(inactive)) => Activity::from_inactivity(inactive),
            Ok(other) => {
                debug!("unexpected inactivity reply: {other:?}");
                Activity::Unknown
            }
            Err(e) => {
                debug!("inactivity query failed: {e}");
                Activity::Unknown
            }
        }
    }
}
