//! One-shot hardware peripheral initialization.
//!
//! Configures the button GPIO and its interrupt using raw ESP-IDF sys
//! calls, and builds the shared I²C bus driver.  Called once from `main()`
//! before the event loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    I2cInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::I2cInitFailed(rc) => write!(f, "I2C driver init failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

// ── I²C bus ───────────────────────────────────────────────────

/// Master driver on I2C0 with the board's SDA/SCL pins.
#[cfg(target_os = "espidf")]
pub fn init_i2c(
    i2c: esp_idf_hal::i2c::I2C0,
    sda: esp_idf_hal::gpio::Gpio21,
    scl: esp_idf_hal::gpio::Gpio22,
) -> Result<esp_idf_hal::i2c::I2cDriver<'static>, HwInitError> {
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::units::Hertz;

    let config = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ));
    let driver = I2cDriver::new(i2c, sda, scl, &config)
        .map_err(|e| HwInitError::I2cInitFailed(e.code()))?;
    info!(
        "hw_init: I2C0 on SDA={} SCL={} at {} Hz",
        pins::I2C_SDA_GPIO,
        pins::I2C_SCL_GPIO,
        pins::I2C_FREQ_HZ
    );
    Ok(driver)
}

// ── Button GPIO ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_button_gpio() -> Result<(), HwInitError> {
    // GPIO 35 is input-only: the pull-up is external.
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::BUTTON_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    info!("hw_init: button GPIO {} configured", pins::BUTTON_GPIO);
    Ok(())
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::events::{push_event, Event};

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time and gpio_get_level are register reads;
    // safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    let level_high = unsafe { gpio_get_level(pins::BUTTON_GPIO) } != 0;
    push_event(Event::ButtonEdge { level_high, at_ms: now_ms });
}

/// Map an ISR registration return code (`ESP_OK` is 0).
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn isr_result(ret: i32) -> Result<(), HwInitError> {
    if ret == 0 {
        Ok(())
    } else {
        Err(HwInitError::IsrInstallFailed(ret))
    }
}

/// Configure the button pin, install the per-pin ISR service and register
/// the button handler.
#[cfg(target_os = "espidf")]
pub fn init_button_isr() -> Result<(), HwInitError> {
    // SAFETY: called once from main() before the event loop.  The ISR only
    // pushes to the lock-free event queue.
    unsafe {
        init_button_gpio()?;

        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        isr_result(gpio_isr_handler_add(
            pins::BUTTON_GPIO,
            Some(button_gpio_isr),
            core::ptr::null_mut(),
        ))?;
        isr_result(gpio_intr_enable(pins::BUTTON_GPIO))?;

        info!("hw_init: ISR service installed (button, any edge)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_button_isr() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): button ISR skipped");
    Ok(())
}
