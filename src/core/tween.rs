//! Frame-rate independent exponential smoothing.

use bevy::prelude::*;

use super::geometry::{shortest_angle_delta, wrap_angle};

/// Fraction of the remaining gap to close this frame for a given rate.
///
/// `1 - e^(-rate * dt)` converges to the target without overshooting and
/// gives the same curve regardless of how the elapsed time is sliced.
pub fn smoothing_factor(rate: f32, dt: f32) -> f32 {
    if rate <= 0.0 || dt <= 0.0 {
        return 0.0;
    }
    1.0 - (-rate * dt).exp()
}

/// Move `current` toward `target` with exponential damping.
pub fn damp_vec3(current: Vec3, target: Vec3, rate: f32, dt: f32) -> Vec3 {
    current.lerp(target, smoothing_factor(rate, dt))
}

/// Turn `current` toward `target` along the shortest arc.
///
/// Differences smaller than `threshold` leave the angle untouched so that
/// sub-threshold noise never produces visible jitter.
pub fn damp_angle(current: f32, target: f32, rate: f32, dt: f32, threshold: f32) -> f32 {
    let delta = shortest_angle_delta(current, target);
    if delta.abs() < threshold {
        return current;
    }
    wrap_angle(current + delta * smoothing_factor(rate, dt))
}
