//! Unified error types for the fan controller firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through the control path without allocation.
//!
//! Nothing in the control path is fatal: bus errors degrade to a stale
//! reading, command errors are reported back to the caller, and config
//! errors only surface during boot.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An I²C transaction with the power meter or fan controller failed.
    Bus(BusError),
    /// A speed command was rejected.
    Command(CommandError),
    /// Configuration or speed table is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The device did not acknowledge its address or a data byte.
    Nack,
    /// Arbitration loss, bus fault, or any other controller error.
    Other,
    /// The device answered but its ID register did not match.
    UnexpectedId { register: u8, value: u16 },
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nack => write!(f, "no acknowledge"),
            Self::Other => write!(f, "bus fault"),
            Self::UnexpectedId { register, value } => {
                write!(f, "unexpected id 0x{value:04X} in register 0x{register:02X}")
            }
        }
    }
}

impl BusError {
    /// Collapse a HAL-specific I²C error into the firmware's bus taxonomy.
    pub fn from_i2c<E: embedded_hal::i2c::Error>(e: &E) -> Self {
        use embedded_hal::i2c::ErrorKind;
        match e.kind() {
            ErrorKind::NoAcknowledge(_) => Self::Nack,
            _ => Self::Other,
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Requested speed index is outside `[0, max]`.
    SpeedOutOfRange { requested: i64, max: u8 },
    /// Request body was not an integer.
    MalformedSpeed { max: u8 },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpeedOutOfRange { requested, max } => {
                write!(f, "speed {requested} out of range 0..={max}")
            }
            Self::MalformedSpeed { max } => {
                write!(f, "speed is not an integer in 0..={max}")
            }
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` names the field and the rule.
    ValidationFailed(&'static str),
    /// The speed table violates one of its structural invariants.
    InvalidTable(&'static str),
    /// A build-time JSON override could not be parsed.
    Malformed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::InvalidTable(msg) => write!(f, "invalid speed table: {msg}"),
            Self::Malformed => write!(f, "malformed config override"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
