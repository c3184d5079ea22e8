//! Published telemetry channels.
//!
//! Each channel carries a Signal K path, a unit string and a human
//! description.  Units follow the labels used on the boat's dashboard
//! rather than strict SI (rotation rate is published in RPM).

use core::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryChannel {
    pub path: &'static str,
    pub unit: &'static str,
    pub description: &'static str,
}

/// Serialises as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Float(f32),
    Int(i64),
}

impl fmt::Display for TelemetryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v:.2}"),
            Self::Int(v) => write!(f, "{v}"),
        }
    }
}

pub const SPEED: TelemetryChannel = TelemetryChannel {
    path: "sensors.stb_fan_speed",
    unit: "index",
    description: "Stb Fan Speed Setting",
};

pub const POWER: TelemetryChannel = TelemetryChannel {
    path: "sensors.stb_fan_power",
    unit: "W",
    description: "Stb Fan Watts",
};

pub const TEMPERATURE: TelemetryChannel = TelemetryChannel {
    path: "sensors.stb_fan_inttemp",
    unit: "K",
    description: "Stb Fan Internal Temp",
};

pub const RPM: TelemetryChannel = TelemetryChannel {
    path: "sensors.stb_fan_tach",
    unit: "RPM",
    description: "Stb Fan Tach",
};

pub const DUTY: TelemetryChannel = TelemetryChannel {
    path: "sensors.stb_fan_duty",
    unit: "%",
    description: "Stb Fan Duty Cycle",
};
