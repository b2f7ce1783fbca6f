//! Pan/tilt control loop for one tracked device.

use shared::{
    domain::{ControlConfig, ControlMode, Orientation, SystemState},
    error::ValidationError,
    protocol::ConfigPatch,
};

use crate::circular::{normalize, smooth_damp_angle};

/// Default smoothing time constant in seconds.
pub const DEFAULT_SMOOTH_TIME: f64 = 0.1;

/// Physical pan/tilt axes. Receives relative per-axis deltas, once per
/// control tick.
pub trait MotorAxes {
    fn rotate(&mut self, delta: Orientation);
}

/// Orientation control loop: in Automatic mode it follows the latest
/// telemetry's measured motor rotation, in Manual mode the stored
/// manual orientation, smoothing both axes independently along the
/// shorter arc.
///
/// All state is owned here and mutated only by the host's tick; a tick
/// is a pure function of `(last_orientation, velocity, target, dt)`.
pub struct OrientationController {
    config: ControlConfig,
    latest_state: Option<SystemState>,
    last_orientation: Orientation,
    angular_velocity: Orientation,
    smooth_time: f64,
}

impl OrientationController {
    pub fn new(smooth_time: f64) -> Self {
        Self {
            config: ControlConfig::default(),
            latest_state: None,
            last_orientation: Orientation::default(),
            angular_velocity: Orientation::default(),
            smooth_time,
        }
    }

    pub fn config(&self) -> ControlConfig {
        self.config
    }

    pub fn mode(&self) -> ControlMode {
        self.config.control_mode
    }

    /// Manual affordances are live only while the stored mode is
    /// Manual.
    pub fn manual_inputs_enabled(&self) -> bool {
        self.config.control_mode == ControlMode::Manual
    }

    /// Smoothed orientation for display mirrors. Reading it never
    /// emits a configuration change.
    pub fn orientation(&self) -> Orientation {
        self.last_orientation
    }

    pub fn latest_state(&self) -> Option<SystemState> {
        self.latest_state
    }

    /// Adopt a full configuration fanned out by the hub.
    pub fn apply_config(&mut self, config: ControlConfig) {
        self.config = config;
    }

    /// Keep only the most recent telemetry snapshot; the previous one
    /// is superseded.
    pub fn apply_state(&mut self, state: SystemState) {
        self.latest_state = Some(state);
    }

    /// Switch modes locally and return the partial update to send
    /// upstream. The patch carries only the new mode.
    pub fn set_mode(&mut self, mode: ControlMode) -> ConfigPatch {
        self.config.control_mode = mode;
        ConfigPatch::mode(mode)
    }

    /// Accept a numeric azimuth edit. The value is normalized before
    /// it is stored or sent; non-numeric input leaves everything
    /// untouched.
    pub fn edit_manual_azimuth(&mut self, input: &str) -> Result<ConfigPatch, ValidationError> {
        let degrees = parse_angle(input)?;
        Ok(self.set_manual_azimuth(degrees))
    }

    pub fn edit_manual_inclination(&mut self, input: &str) -> Result<ConfigPatch, ValidationError> {
        let degrees = parse_angle(input)?;
        Ok(self.set_manual_inclination(degrees))
    }

    pub fn set_manual_azimuth(&mut self, degrees: f64) -> ConfigPatch {
        self.config.manual_orientation.azimuth = normalize(degrees);
        ConfigPatch::orientation(self.config.manual_orientation)
    }

    pub fn set_manual_inclination(&mut self, degrees: f64) -> ConfigPatch {
        self.config.manual_orientation.inclination = normalize(degrees);
        ConfigPatch::orientation(self.config.manual_orientation)
    }

    fn target(&self) -> Orientation {
        match self.config.control_mode {
            ControlMode::Automatic => self
                .latest_state
                .map(|state| state.motors_rotation)
                .unwrap_or(self.last_orientation),
            ControlMode::Manual => self.config.manual_orientation,
        }
    }

    /// One control tick: smooth each axis toward the current target,
    /// hand the per-axis delta to the motors, then wrap the
    /// accumulated orientation back into `[0, 360)`.
    pub fn tick(&mut self, dt: f64, motors: &mut dyn MotorAxes) -> Orientation {
        let target = self.target();
        let next_azimuth = smooth_damp_angle(
            self.last_orientation.azimuth,
            target.azimuth,
            &mut self.angular_velocity.azimuth,
            self.smooth_time,
            dt,
        );
        let next_inclination = smooth_damp_angle(
            self.last_orientation.inclination,
            target.inclination,
            &mut self.angular_velocity.inclination,
            self.smooth_time,
            dt,
        );

        motors.rotate(Orientation::new(
            next_azimuth - self.last_orientation.azimuth,
            next_inclination - self.last_orientation.inclination,
        ));

        self.last_orientation =
            Orientation::new(normalize(next_azimuth), normalize(next_inclination));
        self.last_orientation
    }
}

impl Default for OrientationController {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTH_TIME)
    }
}

fn parse_angle(input: &str) -> Result<f64, ValidationError> {
    let degrees: f64 = input
        .trim()
        .parse()
        .map_err(|_| ValidationError::not_numeric(input))?;
    if !degrees.is_finite() {
        return Err(ValidationError::not_numeric(input));
    }
    Ok(degrees)
}
