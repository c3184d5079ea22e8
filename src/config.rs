//! System configuration parameters
//!
//! All tunable parameters for the fan controller.  Defaults reproduce the
//! timings of the deployed unit; nothing is persisted across restarts.
//! Build-time overrides are taken from environment variables captured with
//! `option_env!` (see [`SystemConfig::load`]).

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Identity / network ---
    /// mDNS hostname and Signal K source label.
    pub hostname: String<32>,
    /// WiFi station SSID (empty = stay offline).
    pub wifi_ssid: String<32>,
    /// WiFi station password (empty = open network).
    pub wifi_password: String<64>,
    /// TCP port of the HTTP control surface.
    pub http_port: u16,
    /// Signal K server host (IPv4 literal or resolvable name).
    pub signalk_host: String<64>,
    /// Signal K server UDP delta input port.
    pub signalk_udp_port: u16,

    // --- Timing ---
    /// Main loop sleep between iterations (milliseconds)
    pub loop_tick_ms: u32,
    /// Power meter sample interval (milliseconds)
    pub power_sample_interval_ms: u32,
    /// Fan controller temperature / duty sample interval (milliseconds)
    pub fan_sample_interval_ms: u32,
    /// Tachometer telemetry burst interval (milliseconds)
    pub tach_sample_interval_ms: u32,
    /// RPM validation interval (milliseconds)
    pub validate_interval_ms: u32,
    /// Remote request mailbox poll interval (milliseconds)
    pub request_poll_interval_ms: u32,
    /// How long an HTTP handler waits for the control loop (milliseconds)
    pub request_timeout_ms: u32,
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,

    // --- Tachometer burst ---
    /// Number of raw tach samples averaged per reading.
    pub tach_burst_samples: u8,
    /// Delay between consecutive tach samples (milliseconds).
    pub tach_burst_spacing_ms: u32,

    // --- Button ---
    /// Quiescence window after an accepted edge (milliseconds).
    pub debounce_ms: u32,

    // --- Smoothing ---
    /// Moving-average window for the power channel (samples).
    pub power_avg_window: u8,
    /// Scale applied to the averaged power value.
    pub power_avg_multiplier: f32,
    /// Moving-average window for the rpm channel; 0 publishes raw values.
    pub rpm_avg_window: u8,
    /// EMA weight for the rpm channel in `(0, 1]`; 0 disables it.  Only one
    /// of `rpm_avg_window` and `rpm_ema_alpha` may be set.
    pub rpm_ema_alpha: f32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            hostname: str_field("stb_fan_control"),
            wifi_ssid: String::new(),
            wifi_password: String::new(),
            http_port: 8080,
            signalk_host: str_field("signalk.local"),
            signalk_udp_port: 4123,

            // Timing
            loop_tick_ms: 10,
            power_sample_interval_ms: 100, // 10 Hz
            fan_sample_interval_ms: 1200,
            tach_sample_interval_ms: 1200,
            validate_interval_ms: 5000,
            request_poll_interval_ms: 50,
            request_timeout_ms: 2000,
            watchdog_timeout_ms: 10_000,

            // Tach burst: 9 reads, 50 ms apart
            tach_burst_samples: 9,
            tach_burst_spacing_ms: 50,

            debounce_ms: 300,

            power_avg_window: 15,
            power_avg_multiplier: 1.0,
            rpm_avg_window: 0,
            rpm_ema_alpha: 0.0,
        }
    }
}

impl SystemConfig {
    /// Defaults, then the whole-document JSON override, then the
    /// individual string overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match option_env!("FANCTL_CONFIG_JSON") {
            Some(json) => Self::from_json(json)?,
            None => Self::default(),
        };
        if let Some(ssid) = option_env!("FANCTL_WIFI_SSID") {
            cfg.wifi_ssid = try_str_field(ssid, "wifi_ssid longer than 32 bytes")?;
        }
        if let Some(pass) = option_env!("FANCTL_WIFI_PASS") {
            cfg.wifi_password = try_str_field(pass, "wifi_password longer than 64 bytes")?;
        }
        if let Some(host) = option_env!("FANCTL_SIGNALK_HOST") {
            cfg.signalk_host = try_str_field(host, "signalk_host longer than 64 bytes")?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a (possibly partial) JSON document; missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| {
            log::error!("Config override rejected: {}", e);
            ConfigError::Malformed
        })
    }

    /// Reject values that would stall the loop or break the samplers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hostname.is_empty() {
            return Err(ConfigError::ValidationFailed("hostname must not be empty"));
        }
        if self.http_port == 0 {
            return Err(ConfigError::ValidationFailed("http_port must be non-zero"));
        }
        if self.loop_tick_ms == 0 || self.loop_tick_ms > 100 {
            return Err(ConfigError::ValidationFailed("loop_tick_ms must be 1..=100"));
        }
        if self.power_sample_interval_ms == 0
            || self.fan_sample_interval_ms == 0
            || self.tach_sample_interval_ms == 0
            || self.validate_interval_ms == 0
            || self.request_poll_interval_ms == 0
        {
            return Err(ConfigError::ValidationFailed("sample intervals must be non-zero"));
        }
        if self.tach_burst_samples == 0 {
            return Err(ConfigError::ValidationFailed("tach_burst_samples must be at least 1"));
        }
        let burst_ms = u32::from(self.tach_burst_samples) * self.tach_burst_spacing_ms;
        if burst_ms >= self.validate_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "tach burst must finish within the validation interval",
            ));
        }
        if self.power_avg_window == 0
            || usize::from(self.power_avg_window) > crate::control::smoothing::MAX_WINDOW
        {
            return Err(ConfigError::ValidationFailed("power_avg_window must be 1..=32"));
        }
        if usize::from(self.rpm_avg_window) > crate::control::smoothing::MAX_WINDOW {
            return Err(ConfigError::ValidationFailed("rpm_avg_window must be 0..=32"));
        }
        if !(0.0..=1.0).contains(&self.rpm_ema_alpha) {
            return Err(ConfigError::ValidationFailed("rpm_ema_alpha must be 0..=1"));
        }
        if self.rpm_ema_alpha > 0.0 && self.rpm_avg_window > 0 {
            return Err(ConfigError::ValidationFailed(
                "rpm_avg_window and rpm_ema_alpha are mutually exclusive",
            ));
        }
        if !self.power_avg_multiplier.is_finite() || self.power_avg_multiplier <= 0.0 {
            return Err(ConfigError::ValidationFailed("power_avg_multiplier must be positive"));
        }
        if self.watchdog_timeout_ms <= self.request_timeout_ms {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must exceed request_timeout_ms",
            ));
        }
        Ok(())
    }
}

fn str_field<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

fn try_str_field<const N: usize>(s: &str, why: &'static str) -> Result<String<N>, ConfigError> {
    let mut out = String::new();
    out.push_str(s).map_err(|()| ConfigError::ValidationFailed(why))?;
    Ok(out)
}
