//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (bus devices, telemetry publisher, event log) implement
//! these traits.  The [`AppService`](super::service::AppService) consumes
//! them via generics, so the domain core never touches hardware directly.
//!
//! Hardware ports are infallible by contract: on a bus error an adapter
//! returns its last good reading (or zero) and logs the fault itself.

use super::events::AppEvent;
use super::telemetry::{TelemetryChannel, TelemetryValue};

// ───────────────────────────────────────────────────────────────
// Power meter port (driven adapter: INA260 → domain)
// ───────────────────────────────────────────────────────────────

pub trait PowerMeterPort {
    /// Instantaneous fan supply power in watts.
    fn read_power_watts(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Fan controller port (driven adapter: domain ↔ EMC2101)
// ───────────────────────────────────────────────────────────────

pub trait FanPort {
    /// Controller die temperature in kelvin.
    fn read_temperature_kelvin(&mut self) -> f32;

    /// One raw tachometer reading in revolutions per minute.
    fn read_rpm(&mut self) -> u32;

    /// Command the PWM duty cycle (0–100).
    fn set_duty_cycle(&mut self, percent: u8);

    /// Duty cycle currently held by the controller register (0–100).
    fn duty_cycle(&mut self) -> u8;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Telemetry port (driven adapter: domain → Signal K)
// ───────────────────────────────────────────────────────────────

/// One named stream per published quantity.
pub trait TelemetrySink {
    fn publish(&mut self, channel: &TelemetryChannel, value: TelemetryValue);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from event system)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a periodic task is due.
///
/// The main loop implements this by pushing into the event queue; the
/// scheduler itself knows nothing about events, queues, or ISRs.
pub trait SchedulerDelegate {
    fn on_task_due(&mut self, label: &str, task: TaskId);
}

/// Periodic callbacks driven by the cooperative scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    /// Read and smooth the power meter.
    PowerSample,
    /// Read controller temperature and live duty, publish speed.
    FanSample,
    /// Start a tachometer burst for telemetry.
    TachSample,
    /// Start a tachometer burst for band validation.
    RpmValidate,
    /// Drain the remote request mailbox.
    RemotePoll,
}
