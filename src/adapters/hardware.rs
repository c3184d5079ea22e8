//! Hardware adapter: bridges the I²C devices to domain port traits.
//!
//! Owns the shared bus and both device handles, exposing them through
//! [`PowerMeterPort`] and [`FanPort`].  Port calls never fail: on a bus
//! error the adapter logs a warning and returns the last good value
//! (zero before the first good read).

use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::ports::{FanPort, PowerMeterPort};
use crate::drivers::emc2101::Emc2101;
use crate::drivers::ina260::Ina260;
use crate::error::BusError;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I2C> {
    bus: I2C,
    ina: Ina260,
    emc: Emc2101,
    last: LastGood,
}

#[derive(Debug, Clone, Copy, Default)]
struct LastGood {
    power_w: f32,
    temperature_k: f32,
    rpm: u32,
    duty: u8,
}

impl<I2C: I2c> HardwareAdapter<I2C> {
    pub fn new(bus: I2C, ina: Ina260, emc: Emc2101) -> Self {
        Self {
            bus,
            ina,
            emc,
            last: LastGood::default(),
        }
    }

    /// Probe the power meter and configure the fan controller.
    pub fn init(&mut self) -> Result<(), BusError> {
        self.ina.probe(&mut self.bus)?;
        self.emc.init(&mut self.bus)
    }

    /// Give the bus back (tests, teardown).
    pub fn release(self) -> I2C {
        self.bus
    }
}

fn or_last<T: Copy>(what: &str, result: Result<T, BusError>, last: &mut T) -> T {
    match result {
        Ok(v) => {
            *last = v;
            v
        }
        Err(e) => {
            warn!("BUS | {} read failed ({}), keeping last value", what, e);
            *last
        }
    }
}

// ── PowerMeterPort implementation ─────────────────────────────

impl<I2C: I2c> PowerMeterPort for HardwareAdapter<I2C> {
    fn read_power_watts(&mut self) -> f32 {
        let r = self.ina.read_power_watts(&mut self.bus);
        or_last("power", r, &mut self.last.power_w)
    }
}

// ── FanPort implementation ────────────────────────────────────

impl<I2C: I2c> FanPort for HardwareAdapter<I2C> {
    fn read_temperature_kelvin(&mut self) -> f32 {
        let r = self.emc.read_temperature_kelvin(&mut self.bus);
        or_last("temperature", r, &mut self.last.temperature_k)
    }

    fn read_rpm(&mut self) -> u32 {
        let r = self.emc.read_rpm(&mut self.bus);
        or_last("tach", r, &mut self.last.rpm)
    }

    fn set_duty_cycle(&mut self, percent: u8) {
        match self.emc.set_duty_cycle(&mut self.bus, percent) {
            Ok(()) => self.last.duty = percent,
            Err(e) => warn!("BUS | duty write {}% failed ({})", percent, e),
        }
    }

    fn duty_cycle(&mut self) -> u8 {
        let r = self.emc.duty_cycle(&mut self.bus);
        or_last("duty", r, &mut self.last.duty)
    }
}
