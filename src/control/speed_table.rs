//! Discrete speed settings: duty cycle and accepted rotation-rate band.
//!
//! The table is fixed at build time.  Index 0 is always "off" and its band
//! must accept a stopped rotor, otherwise a legitimately idle fan would be
//! flagged every validation cycle.

use crate::error::ConfigError;

/// Upper bound on the number of speed settings.
pub const MAX_SPEEDS: usize = 8;

/// Inclusive accepted rotation-rate window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpmBand {
    pub low: u32,
    pub high: u32,
}

impl RpmBand {
    pub const fn new(low: u32, high: u32) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, rpm: f32) -> bool {
        rpm >= self.low as f32 && rpm <= self.high as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedTableEntry {
    pub index: u8,
    pub duty_cycle_percent: u8,
    /// `None` exempts this setting from rpm validation.
    pub band: Option<RpmBand>,
}

/// Off, 63 %, 70 %, 100 %.
pub const DEFAULT_SPEED_TABLE: [SpeedTableEntry; 4] = [
    SpeedTableEntry { index: 0, duty_cycle_percent: 0, band: Some(RpmBand::new(0, 0)) },
    SpeedTableEntry { index: 1, duty_cycle_percent: 63, band: Some(RpmBand::new(600, 900)) },
    SpeedTableEntry { index: 2, duty_cycle_percent: 70, band: Some(RpmBand::new(1000, 1300)) },
    SpeedTableEntry { index: 3, duty_cycle_percent: 100, band: Some(RpmBand::new(1700, 1900)) },
];

/// Validated, immutable view over a speed table.
#[derive(Debug, Clone, Copy)]
pub struct SpeedTable {
    entries: &'static [SpeedTableEntry],
}

impl SpeedTable {
    /// Check the table's structural invariants.
    pub fn new(entries: &'static [SpeedTableEntry]) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::InvalidTable("table is empty"));
        }
        if entries.len() > MAX_SPEEDS {
            return Err(ConfigError::InvalidTable("more than 8 speed settings"));
        }
        for (i, e) in entries.iter().enumerate() {
            if usize::from(e.index) != i {
                return Err(ConfigError::InvalidTable("indices must run 0..N in order"));
            }
            if e.duty_cycle_percent > 100 {
                return Err(ConfigError::InvalidTable("duty cycle above 100%"));
            }
            if let Some(band) = e.band {
                if band.low > band.high {
                    return Err(ConfigError::InvalidTable("band low above band high"));
                }
            }
        }
        let off = &entries[0];
        if off.duty_cycle_percent != 0 {
            return Err(ConfigError::InvalidTable("index 0 must command 0% duty"));
        }
        if off.band.is_some_and(|b| b.low != 0) {
            return Err(ConfigError::InvalidTable("index 0 band must accept a stopped rotor"));
        }
        Ok(Self { entries })
    }

    /// The built-in four-step table.
    pub fn default_table() -> Self {
        Self { entries: &DEFAULT_SPEED_TABLE }
    }

    /// Number of settings (N).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest valid index (N - 1).
    pub fn max_index(&self) -> u8 {
        (self.entries.len() - 1) as u8
    }

    pub fn get(&self, index: u8) -> Option<&SpeedTableEntry> {
        self.entries.get(usize::from(index))
    }

    /// Map an arbitrary requested value onto a table index.
    pub fn lookup(&self, requested: i64) -> Option<&SpeedTableEntry> {
        usize::try_from(requested).ok().and_then(|i| self.entries.get(i))
    }

    pub fn entries(&self) -> &'static [SpeedTableEntry] {
        self.entries
    }
}
