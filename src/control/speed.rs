//! Commanded speed: the single source of truth for what the fan should do.
//!
//! The commanded index lives in a [`SpeedState`] container backed by an
//! atomic, so any context (main loop, HTTP task, telemetry) can read it
//! without tearing.  Only [`SpeedController`] can write it; everyone else
//! receives a read-only [`SpeedReader`] at construction.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use log::{info, warn};

use crate::app::ports::FanPort;
use crate::error::CommandError;

use super::speed_table::{SpeedTable, SpeedTableEntry};

/// A commanded setting as seen by callers: index plus its duty cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedSetting {
    pub index: u8,
    pub duty_cycle_percent: u8,
}

impl From<&SpeedTableEntry> for SpeedSetting {
    fn from(e: &SpeedTableEntry) -> Self {
        Self {
            index: e.index,
            duty_cycle_percent: e.duty_cycle_percent,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Shared state container
// ───────────────────────────────────────────────────────────────

/// Owned container for the commanded index.  Starts at 0 (off).
#[derive(Debug, Default)]
pub struct SpeedState {
    index: Arc<AtomicU8>,
}

impl SpeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a read-only view.
    pub fn reader(&self) -> SpeedReader {
        SpeedReader {
            index: Arc::clone(&self.index),
        }
    }

    fn load(&self) -> u8 {
        self.index.load(Ordering::Acquire)
    }

    fn store(&self, index: u8) {
        self.index.store(index, Ordering::Release);
    }
}

/// Read-only handle on the commanded index.
#[derive(Debug, Clone)]
pub struct SpeedReader {
    index: Arc<AtomicU8>,
}

impl SpeedReader {
    pub fn index(&self) -> u8 {
        self.index.load(Ordering::Acquire)
    }
}

// ───────────────────────────────────────────────────────────────
// SpeedController
// ───────────────────────────────────────────────────────────────

pub struct SpeedController {
    table: SpeedTable,
    state: SpeedState,
}

impl SpeedController {
    /// Takes ownership of the writer side of `state`.
    pub fn new(table: SpeedTable, state: SpeedState) -> Self {
        Self { table, state }
    }

    pub fn table(&self) -> &SpeedTable {
        &self.table
    }

    pub fn reader(&self) -> SpeedReader {
        self.state.reader()
    }

    /// Currently commanded setting.
    pub fn current(&self) -> SpeedSetting {
        let index = self.state.load();
        self.table
            .get(index)
            .map_or(SpeedSetting { index, duty_cycle_percent: 0 }, SpeedSetting::from)
    }

    /// Command `index`.  Exactly one duty write on success, none on error.
    pub fn set(&mut self, index: i64, fan: &mut impl FanPort) -> Result<SpeedSetting, CommandError> {
        let Some(entry) = self.table.lookup(index).copied() else {
            let max = self.table.max_index();
            warn!("SPEED | rejected index {} (valid 0..={})", index, max);
            return Err(CommandError::SpeedOutOfRange { requested: index, max });
        };
        Ok(self.apply(&entry, fan))
    }

    /// Advance to `(current + 1) mod N`.
    pub fn cycle(&mut self, fan: &mut impl FanPort) -> SpeedSetting {
        let next = (usize::from(self.state.load()) + 1) % self.table.len();
        let entry = self.table.entries()[next];
        self.apply(&entry, fan)
    }

    /// Re-write the current setting's duty cycle without changing the index.
    pub fn reassert(&mut self, fan: &mut impl FanPort) -> SpeedSetting {
        let index = usize::from(self.state.load()).min(self.table.len() - 1);
        let entry = self.table.entries()[index];
        self.apply(&entry, fan)
    }

    fn apply(&mut self, entry: &SpeedTableEntry, fan: &mut impl FanPort) -> SpeedSetting {
        let setting = SpeedSetting::from(entry);
        fan.set_duty_cycle(setting.duty_cycle_percent);
        self.state.store(setting.index);
        info!(
            "SPEED | index {} -> {}% duty",
            setting.index, setting.duty_cycle_percent
        );
        setting
    }
}
