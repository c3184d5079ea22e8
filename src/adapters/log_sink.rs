//! Log-based sinks.
//!
//! [`LogEventSink`] writes structured application events to the ESP-IDF
//! logger (UART / USB-CDC in production).  [`LogTelemetrySink`] mirrors
//! telemetry publications to the log, and is what runs when no Signal K
//! server is configured.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, TelemetrySink};
use crate::app::telemetry::{TelemetryChannel, TelemetryValue};

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(s) => {
                info!("START | index={} duty={}%", s.index, s.duty_cycle_percent);
            }
            AppEvent::SpeedChanged { from, to, source } => {
                info!(
                    "SPEED | {} -> {} ({}% duty) via {:?}",
                    from, to.index, to.duty_cycle_percent, source
                );
            }
            AppEvent::CommandRejected(e) => {
                warn!("SPEED | rejected: {}", e);
            }
            AppEvent::RpmCorrection { setting, rpm, band } => {
                warn!(
                    "RPM | {:.0} outside {}..={} at index {}, duty {}% re-asserted",
                    rpm, band.low, band.high, setting.index, setting.duty_cycle_percent
                );
            }
            AppEvent::ButtonPressed => {
                info!("BUTTON | press");
            }
        }
    }
}

/// Telemetry sink that only logs.
#[derive(Debug, Default)]
pub struct LogTelemetrySink;

impl TelemetrySink for LogTelemetrySink {
    fn publish(&mut self, channel: &TelemetryChannel, value: TelemetryValue) {
        debug!("TELEM | {} = {} {}", channel.path, value, channel.unit);
    }
}
