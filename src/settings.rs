//! Simulation-wide flow conditions shared read-only by every element.
use crate::error::ElementError;
use crate::Real;
use nalgebra::{Scalar, Vector3};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// Largest admissible local speed ratio before the local velocity is clamped.
pub const MAX_LOCAL_SPEED_RATIO: f64 = 0.94;

/// Rule limiting the local squared speed before it enters the isentropic relation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedClamp {
    /// Clamp when `v² / a > 0.94`, replacing `v²` by `0.94 a`.
    ///
    /// Note that the ratio compares a squared speed with a speed. This is the rule the
    /// validated legacy results were produced with.
    Legacy,
    /// Clamp when the local Mach number `|v| / a` exceeds `0.94`, replacing `v²` by `(0.94 a)²`.
    MachNumber,
}

impl Default for SpeedClamp {
    fn default() -> Self {
        SpeedClamp::Legacy
    }
}

impl SpeedClamp {
    /// Returns the possibly clamped squared speed and whether the clamp was active.
    pub fn apply<T: Real>(&self, speed_squared: T, sound_velocity: T) -> (T, bool) {
        let limit = T::from_f64(MAX_LOCAL_SPEED_RATIO).unwrap();
        match self {
            SpeedClamp::Legacy => {
                if speed_squared / sound_velocity > limit {
                    (limit * sound_velocity, true)
                } else {
                    (speed_squared, false)
                }
            }
            SpeedClamp::MachNumber => {
                if speed_squared.sqrt() / sound_velocity > limit {
                    let max_speed = limit * sound_velocity;
                    (max_speed * max_speed, true)
                } else {
                    (speed_squared, false)
                }
            }
        }
    }
}

/// Free-stream state and formulation switches.
///
/// Passed by reference into every element computation. Two-dimensional problems only use
/// the first two components of the free-stream velocity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowConditions<T: Scalar> {
    pub free_stream_velocity: Vector3<T>,
    /// Ratio of specific heats, usually denoted by `γ`.
    pub heat_capacity_ratio: T,
    pub sound_velocity: T,
    /// Use the density closure instead of the frozen element density.
    #[serde(default)]
    pub compressible: bool,
    #[serde(default)]
    pub speed_clamp: SpeedClamp,
}

impl<T: Real> FlowConditions<T> {
    pub fn incompressible(free_stream_velocity: Vector3<T>, heat_capacity_ratio: T, sound_velocity: T) -> Self {
        Self {
            free_stream_velocity,
            heat_capacity_ratio,
            sound_velocity,
            compressible: false,
            speed_clamp: SpeedClamp::default(),
        }
    }

    pub fn compressible(free_stream_velocity: Vector3<T>, heat_capacity_ratio: T, sound_velocity: T) -> Self {
        Self {
            compressible: true,
            ..Self::incompressible(free_stream_velocity, heat_capacity_ratio, sound_velocity)
        }
    }

    pub fn with_speed_clamp(self, speed_clamp: SpeedClamp) -> Self {
        Self { speed_clamp, ..self }
    }

    pub fn free_stream_velocity_squared(&self) -> T {
        self.free_stream_velocity.norm_squared()
    }

    pub fn free_stream_mach(&self) -> T {
        self.free_stream_velocity.norm() / self.sound_velocity
    }

    /// Ensures the free-stream scalars were populated with physically meaningful values.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn validate(&self) -> Result<(), ElementError> {
        self.ensure_populated()?;
        if self.heat_capacity_ratio <= 1.0 {
            return Err(ElementError::InvalidFlowConditions {
                reason: format!("heat capacity ratio {} must exceed 1", self.heat_capacity_ratio),
            });
        }
        if self.sound_velocity < 0.0 {
            return Err(ElementError::InvalidFlowConditions {
                reason: format!("sound velocity {} is negative", self.sound_velocity),
            });
        }
        Ok(())
    }

    /// Fails if any free-stream scalar is exactly zero.
    pub fn ensure_populated(&self) -> Result<(), ElementError> {
        let unset = |quantity| Err(ElementError::UnsetFreeStream { quantity });
        if self.free_stream_velocity_squared() == T::zero() {
            return unset("velocity");
        }
        if self.heat_capacity_ratio == T::zero() {
            return unset("heat capacity ratio");
        }
        if self.sound_velocity == T::zero() {
            return unset("sound velocity");
        }
        Ok(())
    }
}
