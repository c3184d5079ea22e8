//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log today).

use crate::control::speed::SpeedSetting;
use crate::control::speed_table::RpmBand;
use crate::error::CommandError;

/// What caused a speed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedSource {
    /// Debounced press of the physical button.
    Button,
    /// `PUT /setFanSpeed`.
    Remote,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started and asserted the initial setting.
    Started(SpeedSetting),

    /// A new commanded speed was written to the fan controller.
    SpeedChanged {
        from: u8,
        to: SpeedSetting,
        source: SpeedSource,
    },

    /// A speed command was rejected; commanded state is unchanged.
    CommandRejected(CommandError),

    /// Measured rpm fell outside the commanded band; duty was re-asserted.
    RpmCorrection {
        setting: SpeedSetting,
        rpm: f32,
        band: RpmBand,
    },

    /// A button edge was accepted by the debouncer.
    ButtonPressed,
}
