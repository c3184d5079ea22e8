//! Remote control surface.
//!
//! - [`surface`]: routing and request handling against the app core
//! - [`channels`]: httpd task ↔ control loop mailbox
//! - `http`: ESP-IDF server adapter (target only)

pub mod channels;
#[cfg(target_os = "espidf")]
pub mod http;
pub mod surface;
