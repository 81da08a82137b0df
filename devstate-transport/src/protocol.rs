//! MCE D-Bus protocol constants
//!
//! Service, path, and member names of the mode-control entity. Requests go
//! to the request interface; change notifications arrive on the signal
//! interface.

/// Well-known bus name of the service
pub const MCE_SERVICE: &str = "com.nokia.mce";

/// Object path for method calls
pub const MCE_REQUEST_PATH: &str = "/com/nokia/mce/request";
/// Interface for method calls
pub const MCE_REQUEST_IF: &str = "com.nokia.mce.request";

/// Object path signals are emitted from
pub const MCE_SIGNAL_PATH: &str = "/com/nokia/mce/signal";
/// Interface signals are emitted on
pub const MCE_SIGNAL_IF: &str = "com.nokia.mce.signal";

// === Display ===

/// Query current display status; replies with a string
pub const DISPLAY_STATUS_GET: &str = "get_display_status";
/// Request display on / dimmed / off (no reply)
pub const DISPLAY_ON_REQ: &str = "req_display_state_on";
pub const DISPLAY_DIM_REQ: &str = "req_display_state_dim";
pub const DISPLAY_OFF_REQ: &str = "req_display_state_off";
/// Keep the display from blanking until cancelled or renewed
pub const PREVENT_BLANK_REQ: &str = "req_display_blanking_pause";
pub const CANCEL_PREVENT_BLANK_REQ: &str = "req_display_cancel_blanking_pause";
/// Display status changed; carries a string argument
pub const DISPLAY_SIG: &str = "display_status_ind";

/// Raw display status strings
pub const DISPLAY_ON_STRING: &str = "on";
pub const DISPLAY_DIM_STRING: &str = "dimmed";
pub const DISPLAY_OFF_STRING: &str = "off";

// === Radio states / device mode ===

/// Query radio state bitmask; replies with a u32
pub const RADIO_STATES_GET: &str = "get_radio_states";
/// Change radio states; arguments are (states, mask), both u32
pub const RADIO_STATES_CHANGE_REQ: &str = "req_radio_states_change";
/// Radio states changed; carries the u32 bitmask
pub const RADIO_STATES_SIG: &str = "radio_states_ind";

/// Master radio bit: set means normal mode, clear means flight mode
pub const RADIO_STATE_MASTER: u32 = 1;

// === Power-save mode ===

/// Query power-save mode; replies with a bool
pub const PSM_STATE_GET: &str = "get_powersave_mode";
/// Power-save mode changed; carries a bool
pub const PSM_STATE_SIG: &str = "powersave_mode_ind";

// === User activity ===

/// Query inactivity status; replies with a bool (true = inactive)
pub const INACTIVITY_STATUS_GET: &str = "get_inactivity_status";
/// Inactivity changed; carries a bool (true = inactive)
pub const INACTIVITY_SIG: &str = "system_inactivity_ind";
