//! Fan speed control: the speed table, the commanded-speed controller,
//! tachometer sampling and validation, and telemetry smoothing.

pub mod smoothing;
pub mod speed;
pub mod speed_table;
pub mod tach_burst;
pub mod validator;
