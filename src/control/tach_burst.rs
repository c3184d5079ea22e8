//! Non-blocking multi-sample tachometer read.
//!
//! A single tach reading is noisy, so each rpm figure is the mean of a short
//! burst of raw samples spaced a fixed delay apart (letting the sensor's
//! internal average settle).  Instead of sleeping between samples, the
//! burst is polled once per main-loop iteration with the current monotonic
//! time and takes a sample whenever one is due.
//!
//! Telemetry and validation both need bursts.  A request that arrives while
//! a burst is running joins it, so one burst can serve both.

use log::debug;

use crate::app::ports::FanPort;

/// Why a burst was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstPurpose {
    Telemetry,
    Validation,
}

impl BurstPurpose {
    const fn bit(self) -> u8 {
        match self {
            Self::Telemetry => 0b01,
            Self::Validation => 0b10,
        }
    }
}

/// Small set of [`BurstPurpose`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Purposes(u8);

impl Purposes {
    pub fn contains(self, p: BurstPurpose) -> bool {
        self.0 & p.bit() != 0
    }

    fn insert(&mut self, p: BurstPurpose) {
        self.0 |= p.bit();
    }

    fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Result of a completed burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstReading {
    pub mean_rpm: f32,
    pub purposes: Purposes,
}

pub struct TachBurst {
    samples: u8,
    spacing_ms: u32,
    purposes: Purposes,
    taken: u8,
    sum: u64,
    next_due_ms: u32,
}

impl TachBurst {
    pub fn new(samples: u8, spacing_ms: u32) -> Self {
        Self {
            samples: samples.max(1),
            spacing_ms,
            purposes: Purposes::default(),
            taken: 0,
            sum: 0,
            next_due_ms: 0,
        }
    }

    /// Whether a burst is in flight.
    pub fn is_active(&self) -> bool {
        !self.purposes.is_empty()
    }

    /// Arm a burst, or add `purpose` to the one already running.
    pub fn request(&mut self, purpose: BurstPurpose, now_ms: u32) {
        if !self.is_active() {
            self.taken = 0;
            self.sum = 0;
            self.next_due_ms = now_ms.wrapping_add(self.spacing_ms);
        }
        self.purposes.insert(purpose);
    }

    /// Take at most one sample if due.  Returns the mean once the burst
    /// has collected all of its samples.
    pub fn poll(&mut self, now_ms: u32, fan: &mut impl FanPort) -> Option<BurstReading> {
        if !self.is_active() || !time_reached(now_ms, self.next_due_ms) {
            return None;
        }

        self.sum += u64::from(fan.read_rpm());
        self.taken += 1;
        self.next_due_ms = now_ms.wrapping_add(self.spacing_ms);

        if self.taken < self.samples {
            return None;
        }

        let reading = BurstReading {
            mean_rpm: self.sum as f32 / f32::from(self.taken),
            purposes: self.purposes,
        };
        debug!("TACH | burst of {} -> {:.0} rpm", self.taken, reading.mean_rpm);
        self.purposes = Purposes::default();
        Some(reading)
    }
}

/// Wrapping-safe `now >= deadline` for u32 millisecond clocks.
fn time_reached(now_ms: u32, deadline_ms: u32) -> bool {
    now_ms.wrapping_sub(deadline_ms) < u32::MAX / 2
}
