//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (button, HTTP
//! control surface) that the [`AppService`](super::service::AppService)
//! interprets and acts upon.

use super::events::SpeedSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Command an explicit speed index.  Out-of-range values are rejected
    /// without touching the fan.
    SetSpeed { index: i64, source: SpeedSource },

    /// Advance to the next speed, wrapping back to off.
    CycleSpeed,
}
