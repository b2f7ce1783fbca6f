use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one connected transport endpoint, assigned by the hub
/// on connect and forgotten on disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub Uuid);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Pan/tilt orientation in degrees. Both axes are circular values with
/// period 360; stored values are kept in `[0, 360)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub azimuth: f64,
    pub inclination: f64,
}

impl Orientation {
    pub fn new(azimuth: f64, inclination: f64) -> Self {
        Self {
            azimuth,
            inclination,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMode {
    Automatic,
    Manual,
}

/// The single authoritative control configuration. One instance lives
/// inside the hub; it is merged in place and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlConfig {
    pub control_mode: ControlMode,
    pub manual_orientation: Orientation,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            control_mode: ControlMode::Manual,
            manual_orientation: Orientation::default(),
        }
    }
}

/// Platform attitude estimate produced by the device's sensor fusion.
/// Carried opaquely; neither the hub nor the console interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Telemetry snapshot reported by the tracking device. Relayed by the
/// hub without storage; receivers keep only the most recent one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemState {
    /// Unix milliseconds on the device clock.
    pub timestamp: i64,
    pub solar_panel_voltage: f64,
    pub panel_orientation: Orientation,
    pub motors_rotation: Orientation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_rotation: Option<Quaternion>,
}
