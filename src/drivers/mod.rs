//! Device drivers, hardware initialisation, and peripheral helpers.

pub mod button;
pub mod emc2101;
pub mod hw_init;
pub mod ina260;
pub mod watchdog;
