//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                 | Connects to                 |
//! |------------|----------------------------|-----------------------------|
//! | `hardware` | PowerMeterPort, FanPort    | INA260 + EMC2101 over I²C   |
//! | `log_sink` | EventSink, TelemetrySink   | Serial log output           |
//! | `signalk`  | TelemetrySink              | Signal K server (UDP delta) |
//! | `time`     |                            | ESP32 high-resolution timer |
//! | `wifi`     | ConnectivityPort           | ESP-IDF WiFi STA            |
//! | `mdns`     |                            | ESP-IDF mDNS responder      |

pub mod hardware;
pub mod log_sink;
pub mod mdns;
pub mod signalk;
pub mod time;
pub mod wifi;
