//! Microchip EMC2101 fan controller.
//!
//! Used in direct-setting mode: the look-up table is disabled and the fan
//! setting register holds the PWM duty on a 0–63 scale.  The tach input
//! shares the ALERT pin and must be enabled in the configuration register.

use embedded_hal::i2c::I2c;
use log::info;

use crate::error::BusError;

pub const DEFAULT_ADDRESS: u8 = 0x4C;

const REG_INTERNAL_TEMP: u8 = 0x00;
const REG_CONFIG: u8 = 0x03;
const REG_TACH_LOW: u8 = 0x46;
const REG_TACH_HIGH: u8 = 0x47;
const REG_FAN_CONFIG: u8 = 0x4A;
const REG_FAN_SETTING: u8 = 0x4C;
const REG_PWM_FREQ: u8 = 0x4D;
const REG_PRODUCT_ID: u8 = 0xFD;

const CONFIG_TACH_ENABLE: u8 = 1 << 2;
const FAN_CONFIG_LUT_DISABLE: u8 = 1 << 5;
const PWM_FREQ_DEFAULT: u8 = 0x1F;

const PRODUCT_IDS: [u8; 2] = [0x16, 0x28];

/// Full-scale value of the fan setting register.
pub const FAN_SETTING_MAX: u8 = 63;

const TACH_CONSTANT: u32 = 5_400_000;
const TACH_STALLED: u16 = 0xFFFF;

const KELVIN_OFFSET: f32 = 273.15;

/// Stateless handle: the bus is borrowed per call so it can be shared.
#[derive(Debug, Clone, Copy)]
pub struct Emc2101 {
    address: u8,
}

impl Emc2101 {
    pub fn new(address: u8) -> Self {
        Self { address }
    }

    /// Check the product ID and put the part into direct-setting mode with
    /// the tach input enabled.
    pub fn init<I: I2c>(&self, bus: &mut I) -> Result<(), BusError> {
        let id = self.read(bus, REG_PRODUCT_ID)?;
        if !PRODUCT_IDS.contains(&id) {
            return Err(BusError::UnexpectedId {
                register: REG_PRODUCT_ID,
                value: u16::from(id),
            });
        }

        let config = self.read(bus, REG_CONFIG)?;
        self.write(bus, REG_CONFIG, config | CONFIG_TACH_ENABLE)?;

        let fan_config = self.read(bus, REG_FAN_CONFIG)?;
        self.write(bus, REG_FAN_CONFIG, fan_config | FAN_CONFIG_LUT_DISABLE)?;

        self.write(bus, REG_PWM_FREQ, PWM_FREQ_DEFAULT)?;

        info!("EMC2101 | product 0x{:02X} at 0x{:02X}, direct mode", id, self.address);
        Ok(())
    }

    /// Internal diode temperature in kelvin.
    pub fn read_temperature_kelvin<I: I2c>(&self, bus: &mut I) -> Result<f32, BusError> {
        let raw = self.read(bus, REG_INTERNAL_TEMP)? as i8;
        Ok(f32::from(raw) + KELVIN_OFFSET)
    }

    /// One tach reading.  A zero or saturated count reads as 0 rpm.
    pub fn read_rpm<I: I2c>(&self, bus: &mut I) -> Result<u32, BusError> {
        // Low byte first: reading it latches the high byte.
        let low = self.read(bus, REG_TACH_LOW)?;
        let high = self.read(bus, REG_TACH_HIGH)?;
        Ok(count_to_rpm(u16::from_le_bytes([low, high])))
    }

    pub fn set_duty_cycle<I: I2c>(&self, bus: &mut I, percent: u8) -> Result<(), BusError> {
        self.write(bus, REG_FAN_SETTING, percent_to_setting(percent))
    }

    pub fn duty_cycle<I: I2c>(&self, bus: &mut I) -> Result<u8, BusError> {
        Ok(setting_to_percent(self.read(bus, REG_FAN_SETTING)?))
    }

    fn read<I: I2c>(&self, bus: &mut I, register: u8) -> Result<u8, BusError> {
        let mut buf = [0u8; 1];
        bus.write_read(self.address, &[register], &mut buf)
            .map_err(|e| BusError::from_i2c(&e))?;
        Ok(buf[0])
    }

    fn write<I: I2c>(&self, bus: &mut I, register: u8, value: u8) -> Result<(), BusError> {
        bus.write(self.address, &[register, value])
            .map_err(|e| BusError::from_i2c(&e))
    }
}

pub fn count_to_rpm(count: u16) -> u32 {
    match count {
        0 | TACH_STALLED => 0,
        c => TACH_CONSTANT / u32::from(c),
    }
}

pub fn percent_to_setting(percent: u8) -> u8 {
    let p = u32::from(percent.min(100));
    ((p * u32::from(FAN_SETTING_MAX) + 50) / 100) as u8
}

pub fn setting_to_percent(setting: u8) -> u8 {
    let s = u32::from(setting.min(FAN_SETTING_MAX));
    ((s * 100 + u32::from(FAN_SETTING_MAX) / 2) / u32::from(FAN_SETTING_MAX)) as u8
}
