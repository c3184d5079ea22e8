//! Application core: pure domain logic, zero I/O.
//!
//! Speed selection, tach validation and sensor smoothing are driven from
//! here.  All interaction with hardware and the network happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod telemetry;
