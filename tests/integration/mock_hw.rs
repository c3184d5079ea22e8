//! Mock hardware and sinks for integration tests.
//!
//! Records every duty write and every published value so tests can
//! assert on the full history without a real I²C bus.

use std::collections::VecDeque;

use fanctl::app::events::AppEvent;
use fanctl::app::ports::{EventSink, FanPort, PowerMeterPort, TelemetrySink};
use fanctl::app::service::AppService;
use fanctl::app::telemetry::{TelemetryChannel, TelemetryValue};
use fanctl::config::SystemConfig;
use fanctl::control::speed_table::SpeedTable;

// ── MockFan ───────────────────────────────────────────────────

pub struct MockFan {
    pub duty_writes: Vec<u8>,
    pub duty: u8,
    pub temperature_k: f32,
    /// Queued tach readings; the last one repeats once drained.
    pub rpm: VecDeque<u32>,
    pub power_w: f32,
}

#[allow(dead_code)]
impl MockFan {
    pub fn new() -> Self {
        Self {
            duty_writes: Vec::new(),
            duty: 0,
            temperature_k: 308.15,
            rpm: VecDeque::from([0]),
            power_w: 0.0,
        }
    }

    pub fn spinning_at(mut self, rpm: u32) -> Self {
        self.rpm = VecDeque::from([rpm]);
        self
    }

    pub fn last_write(&self) -> Option<u8> {
        self.duty_writes.last().copied()
    }
}

impl Default for MockFan {
    fn default() -> Self {
        Self::new()
    }
}

impl FanPort for MockFan {
    fn read_temperature_kelvin(&mut self) -> f32 {
        self.temperature_k
    }

    fn read_rpm(&mut self) -> u32 {
        if self.rpm.len() > 1 {
            self.rpm.pop_front().unwrap_or(0)
        } else {
            self.rpm.front().copied().unwrap_or(0)
        }
    }

    fn set_duty_cycle(&mut self, percent: u8) {
        self.duty_writes.push(percent);
        self.duty = percent;
    }

    fn duty_cycle(&mut self) -> u8 {
        self.duty
    }
}

impl PowerMeterPort for MockFan {
    fn read_power_watts(&mut self) -> f32 {
        self.power_w
    }
}

// ── Sinks ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

#[derive(Default)]
pub struct RecordingTelemetry {
    pub published: Vec<(&'static str, TelemetryValue)>,
}

#[allow(dead_code)]
impl RecordingTelemetry {
    pub fn values_for(&self, path: &str) -> Vec<TelemetryValue> {
        self.published
            .iter()
            .filter(|(p, _)| *p == path)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn publish(&mut self, channel: &TelemetryChannel, value: TelemetryValue) {
        self.published.push((channel.path, value));
    }
}

// ── Fixture ───────────────────────────────────────────────────

pub struct Rig {
    pub app: AppService,
    pub fan: MockFan,
    pub sink: RecordingSink,
    pub telemetry: RecordingTelemetry,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_config(&SystemConfig::default())
    }

    pub fn with_config(config: &SystemConfig) -> Self {
        let mut rig = Self {
            app: AppService::new(config, SpeedTable::default_table()),
            fan: MockFan::new(),
            sink: RecordingSink::default(),
            telemetry: RecordingTelemetry::default(),
        };
        rig.app.start(&mut rig.fan, &mut rig.sink);
        rig
    }
}
