//! GPIO / peripheral assignments for the fan controller board.
//!
//! Single source of truth: drivers reference this module rather than
//! hard-coding pin numbers or bus addresses.

// ---------------------------------------------------------------------------
// I²C bus (INA260 + EMC2101)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
/// Standard-mode bus clock.
pub const I2C_FREQ_HZ: u32 = 100_000;

pub const INA260_ADDRESS: u8 = crate::drivers::ina260::DEFAULT_ADDRESS;
pub const EMC2101_ADDRESS: u8 = crate::drivers::emc2101::DEFAULT_ADDRESS;

// ---------------------------------------------------------------------------
// User button (active-low with external pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button that cycles the fan speed.  GPIO 35 is input-only
/// and has no internal pull resistors.
pub const BUTTON_GPIO: i32 = 35;
