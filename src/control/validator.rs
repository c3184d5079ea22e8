//! Tachometer band validation.
//!
//! The fan controller's duty register occasionally loses its value (brown
//! out, bus glitch), leaving the fan stalled or surging.  Every validation
//! tick compares the measured rpm against the band of the *commanded*
//! setting and, when it is outside, re-writes the same duty cycle.
//!
//! The validator holds no state between ticks: a retry is simply the next
//! tick.  It never changes which speed is commanded.

use log::{debug, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, FanPort};

use super::speed::{SpeedController, SpeedSetting};
use super::speed_table::{RpmBand, SpeedTable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Measured rpm sits inside the commanded band.
    InBand { band: RpmBand },
    /// The commanded setting has validation disabled.
    Exempt,
    /// Measured rpm is outside the band; duty was re-asserted.
    OutOfBand { band: RpmBand, rpm: f32 },
}

pub struct RpmValidator {
    table: SpeedTable,
}

impl RpmValidator {
    pub fn new(table: SpeedTable) -> Self {
        Self { table }
    }

    /// Pure classification of a measurement against a setting's band.
    pub fn evaluate(&self, setting: SpeedSetting, mean_rpm: f32) -> Verdict {
        match self.table.get(setting.index).and_then(|e| e.band) {
            None => Verdict::Exempt,
            Some(band) if band.contains(mean_rpm) => Verdict::InBand { band },
            Some(band) => Verdict::OutOfBand { band, rpm: mean_rpm },
        }
    }

    /// Classify and, when out of band, re-assert the commanded duty.
    pub fn check(
        &self,
        mean_rpm: f32,
        controller: &mut SpeedController,
        fan: &mut impl FanPort,
        sink: &mut impl EventSink,
    ) -> Verdict {
        let setting = controller.current();
        let verdict = self.evaluate(setting, mean_rpm);
        match verdict {
            Verdict::OutOfBand { band, rpm } => {
                warn!(
                    "RPM | {:.0} outside {}..={} for index {}, re-asserting {}% duty",
                    rpm, band.low, band.high, setting.index, setting.duty_cycle_percent
                );
                let setting = controller.reassert(fan);
                sink.emit(&AppEvent::RpmCorrection { setting, rpm, band });
            }
            Verdict::InBand { .. } => {
                debug!("RPM | {:.0} in band for index {}", mean_rpm, setting.index);
            }
            Verdict::Exempt => {}
        }
        verdict
    }
}
