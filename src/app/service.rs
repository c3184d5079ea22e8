//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the speed controller, the rpm validator, the tach
//! burst sampler, the button debouncer and the telemetry filters.  It
//! exposes a hardware-agnostic API; all I/O flows through port traits
//! injected at call sites, so the whole service runs against mocks.
//!
//! ```text
//! PowerMeterPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                    │          AppService          │
//!        FanPort ◀──▶│ Speed · Validator · Smoothing│ ──▶ TelemetrySink
//!                    └──────────────────────────────┘
//! ```

use log::{debug, info};
use serde::Serialize;

use crate::config::SystemConfig;
use crate::control::smoothing::ChannelFilter;
use crate::control::speed::{SpeedController, SpeedReader, SpeedSetting, SpeedState};
use crate::control::speed_table::SpeedTable;
use crate::control::tach_burst::{BurstPurpose, BurstReading, TachBurst};
use crate::control::validator::{RpmValidator, Verdict};
use crate::drivers::button::Debouncer;
use crate::error::CommandError;

use super::commands::AppCommand;
use super::events::{AppEvent, SpeedSource};
use super::ports::{EventSink, FanPort, PowerMeterPort, TelemetrySink};
use super::telemetry::{DUTY, POWER, RPM, SPEED, TEMPERATURE, TelemetryValue};

const KELVIN_OFFSET: f32 = 273.15;

/// Snapshot served by `GET /status`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSnapshot {
    #[serde(rename = "currentSpeed")]
    pub current_speed: u8,
    #[serde(rename = "currentRPM")]
    pub current_rpm: f32,
    /// Degrees Celsius.
    #[serde(rename = "currentTemp")]
    pub current_temp: f32,
    /// Smoothed watts.
    #[serde(rename = "currentPower")]
    pub current_power: f32,
}

/// Latest values seen by the periodic samplers.
#[derive(Debug, Clone, Copy, Default)]
struct Readings {
    power_w: f32,
    temperature_k: Option<f32>,
    rpm: f32,
    duty: u8,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    speed: SpeedController,
    validator: RpmValidator,
    burst: TachBurst,
    debouncer: Debouncer,
    power_filter: ChannelFilter,
    rpm_filter: ChannelFilter,
    readings: Readings,
}

impl AppService {
    /// Construct the service.  Does **not** touch the fan; call
    /// [`start`](Self::start) next.
    pub fn new(config: &SystemConfig, table: SpeedTable) -> Self {
        Self {
            speed: SpeedController::new(table, SpeedState::new()),
            validator: RpmValidator::new(table),
            burst: TachBurst::new(config.tach_burst_samples, config.tach_burst_spacing_ms),
            debouncer: Debouncer::new(config.debounce_ms),
            power_filter: ChannelFilter::from_window(
                config.power_avg_window,
                config.power_avg_multiplier,
            ),
            rpm_filter: ChannelFilter::from_settings(
                config.rpm_avg_window,
                1.0,
                config.rpm_ema_alpha,
            ),
            readings: Readings::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Assert the off setting once so the fan starts in a known state.
    pub fn start(&mut self, fan: &mut impl FanPort, sink: &mut impl EventSink) {
        let setting = self.speed.reassert(fan);
        self.readings.duty = setting.duty_cycle_percent;
        sink.emit(&AppEvent::Started(setting));
        info!(
            "AppService started at index {} ({} speeds)",
            setting.index,
            self.speed.table().len()
        );
    }

    // ── Commands ──────────────────────────────────────────────

    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        fan: &mut impl FanPort,
        sink: &mut impl EventSink,
        telemetry: &mut impl TelemetrySink,
    ) -> Result<SpeedSetting, CommandError> {
        let from = self.speed.current().index;
        let (result, source) = match cmd {
            AppCommand::SetSpeed { index, source } => (self.speed.set(index, fan), source),
            AppCommand::CycleSpeed => (Ok(self.speed.cycle(fan)), SpeedSource::Button),
        };

        match result {
            Ok(to) => {
                self.readings.duty = to.duty_cycle_percent;
                sink.emit(&AppEvent::SpeedChanged { from, to, source });
                publish_speed(telemetry, to);
            }
            Err(e) => sink.emit(&AppEvent::CommandRejected(e)),
        }
        result
    }

    /// Feed one raw button edge.  A debounced press cycles the speed.
    pub fn on_button_edge(
        &mut self,
        level_high: bool,
        now_ms: u32,
        fan: &mut impl FanPort,
        sink: &mut impl EventSink,
        telemetry: &mut impl TelemetrySink,
    ) -> Option<SpeedSetting> {
        self.debouncer.on_edge(level_high, now_ms)?;
        sink.emit(&AppEvent::ButtonPressed);
        self.handle_command(AppCommand::CycleSpeed, fan, sink, telemetry).ok()
    }

    // ── Periodic samplers ─────────────────────────────────────

    pub fn sample_power(
        &mut self,
        meter: &mut impl PowerMeterPort,
        telemetry: &mut impl TelemetrySink,
    ) {
        let raw = meter.read_power_watts();
        let smoothed = self.power_filter.update(raw);
        self.readings.power_w = smoothed;
        telemetry.publish(&POWER, TelemetryValue::Float(smoothed));
    }

    /// Controller temperature, live duty register and commanded speed.
    pub fn sample_fan(&mut self, fan: &mut impl FanPort, telemetry: &mut impl TelemetrySink) {
        let kelvin = fan.read_temperature_kelvin();
        self.readings.temperature_k = Some(kelvin);
        self.readings.duty = fan.duty_cycle();

        telemetry.publish(&TEMPERATURE, TelemetryValue::Float(kelvin));
        telemetry.publish(
            &SPEED,
            TelemetryValue::Int(i64::from(self.speed.current().index)),
        );
        telemetry.publish(
            &DUTY,
            TelemetryValue::Int(i64::from(self.readings.duty)),
        );
    }

    pub fn request_burst(&mut self, purpose: BurstPurpose, now_ms: u32) {
        self.burst.request(purpose, now_ms);
    }

    /// Advance a running tach burst.  On completion, publish and/or
    /// validate according to the burst's purposes.
    pub fn poll_tach(
        &mut self,
        now_ms: u32,
        fan: &mut impl FanPort,
        sink: &mut impl EventSink,
        telemetry: &mut impl TelemetrySink,
    ) -> Option<BurstReading> {
        let reading = self.burst.poll(now_ms, fan)?;
        self.readings.rpm = reading.mean_rpm;

        if reading.purposes.contains(BurstPurpose::Telemetry) {
            let value = if self.rpm_filter.is_passthrough() {
                TelemetryValue::Int(reading.mean_rpm.round() as i64)
            } else {
                TelemetryValue::Float(self.rpm_filter.update(reading.mean_rpm))
            };
            telemetry.publish(&RPM, value);
        }

        if reading.purposes.contains(BurstPurpose::Validation) {
            let verdict = self
                .validator
                .check(reading.mean_rpm, &mut self.speed, fan, sink);
            if let Verdict::OutOfBand { .. } = verdict {
                self.readings.duty = self.speed.current().duty_cycle_percent;
            }
            debug!("RPM | validation verdict {:?}", verdict);
        }

        Some(reading)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn current_speed(&self) -> SpeedSetting {
        self.speed.current()
    }

    pub fn speed_reader(&self) -> SpeedReader {
        self.speed.reader()
    }

    pub fn speed_table(&self) -> &SpeedTable {
        self.speed.table()
    }

    pub fn is_sampling_tach(&self) -> bool {
        self.burst.is_active()
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            current_speed: self.speed.current().index,
            current_rpm: self.readings.rpm,
            current_temp: self
                .readings
                .temperature_k
                .map_or(0.0, |k| k - KELVIN_OFFSET),
            current_power: self.readings.power_w,
        }
    }
}

fn publish_speed(telemetry: &mut impl TelemetrySink, setting: SpeedSetting) {
    telemetry.publish(
        &SPEED,
        TelemetryValue::Int(i64::from(setting.index)),
    );
    telemetry.publish(
        &DUTY,
        TelemetryValue::Int(i64::from(setting.duty_cycle_percent)),
    );
}
