//! Helpers for degree quantities with period 360, where 0 and 360
//! denote the same physical orientation.

pub const FULL_TURN: f64 = 360.0;

const MIN_SMOOTH_TIME: f64 = 1e-4;

/// Floored modulo into `[0, 360)`. Negative inputs wrap: -10 -> 350.
pub fn normalize(degrees: f64) -> f64 {
    let wrapped = degrees - FULL_TURN * (degrees / FULL_TURN).floor();
    // Rounding can land tiny negatives exactly on 360.
    if wrapped >= FULL_TURN {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest difference from `current` to `target`, in
/// `(-180, 180]`.
pub fn delta_angle(current: f64, target: f64) -> f64 {
    let delta = normalize(target - current);
    if delta > FULL_TURN / 2.0 {
        delta - FULL_TURN
    } else {
        delta
    }
}

/// One step of critically damped interpolation toward `target`,
/// travelling the shorter of the two arcs around the circle.
///
/// `velocity` is the per-axis state threaded across ticks; it is read
/// and written on every call. `smooth_time` is roughly the time to
/// close most of the remaining gap; `dt` must be positive. The return
/// value is the new current angle, not yet normalized, so the caller
/// can derive the per-tick delta before wrapping.
pub fn smooth_damp_angle(
    current: f64,
    target: f64,
    velocity: &mut f64,
    smooth_time: f64,
    dt: f64,
) -> f64 {
    let target = current + delta_angle(current, target);
    smooth_damp(current, target, velocity, smooth_time, dt)
}

/// Critically damped spring-damper step on a plain (non-circular)
/// value, with an overshoot clamp so repeated calls converge
/// monotonically onto a fixed target.
fn smooth_damp(current: f64, target: f64, velocity: &mut f64, smooth_time: f64, dt: f64) -> f64 {
    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;

    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    // Clamp when the spring carries past the target.
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }

    output
}
