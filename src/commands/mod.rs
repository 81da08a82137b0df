//! Command handlers (split from main.rs)

pub mod query;
pub mod set;
pub mod watch;
