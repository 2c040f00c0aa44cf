//! Isentropic density closure relating the local flow speed to the density.
use crate::error::ElementError;
use crate::settings::FlowConditions;
use crate::Real;
use log::{debug, warn};
use nalgebra::{DVector, Scalar};
use numeric_literals::replace_float_literals;

/// Fraction of the free-stream density used when the isentropic relation breaks down.
pub const FALLBACK_DENSITY_FRACTION: f64 = 1e-5;

/// Which branch of the closure produced a [`DensityResponse`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DensityRegime {
    Isentropic,
    /// The local speed exceeded the admissible limit and was clamped.
    Clamped,
    /// The isentropic base was non-positive and the density was regularized.
    Fallback,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DensityResponse<T: Scalar> {
    pub density: T,
    /// Derivative of the density with respect to the squared local speed.
    pub derivative: T,
    pub regime: DensityRegime,
}

/// Evaluates the density closure for the local velocity `velocity`.
pub fn compute_density<T: Real>(
    conditions: &FlowConditions<T>,
    density_infinity: T,
    velocity: &DVector<T>,
) -> Result<DensityResponse<T>, ElementError> {
    compute_density_from_speed_squared(conditions, density_infinity, velocity.norm_squared())
}

/// Evaluates the density closure for a given squared local speed.
///
/// The speed is clamped according to [`FlowConditions::speed_clamp`] before anything else is
/// computed. With
/// $$ b = 1 + \frac{\gamma - 1}{2 a^2} \left( v_\infty^2 - v^2 \right) $$
/// the density is $\rho_\infty b^{1/(\gamma - 1)}$. A non-positive base does not abort the
/// computation; instead a small fraction of the free-stream density is used so that the
/// nonlinear iteration can continue.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn compute_density_from_speed_squared<T: Real>(
    conditions: &FlowConditions<T>,
    density_infinity: T,
    speed_squared: T,
) -> Result<DensityResponse<T>, ElementError> {
    conditions.ensure_populated()?;
    if density_infinity == 0.0 {
        return Err(ElementError::UnsetFreeStream { quantity: "density" });
    }

    let vinfinity_norm2 = conditions.free_stream_velocity_squared();
    let gamma = conditions.heat_capacity_ratio;
    let a = conditions.sound_velocity;

    let (v_norm2, clamped) = conditions.speed_clamp.apply(speed_squared, a);
    if clamped {
        debug!(
            "Local squared speed {} exceeds the admissible limit, clamped to {}",
            speed_squared, v_norm2
        );
    }

    let base = 1.0 + (gamma - 1.0) * vinfinity_norm2 * (1.0 - v_norm2 / vinfinity_norm2) / (2.0 * a * a);

    if base > 0.0 {
        Ok(DensityResponse {
            density: density_infinity * base.powf(1.0 / (gamma - 1.0)),
            derivative: -density_infinity * base.powf((2.0 - gamma) / (gamma - 1.0)) / (2.0 * a * a),
            regime: if clamped {
                DensityRegime::Clamped
            } else {
                DensityRegime::Isentropic
            },
        })
    } else {
        let density = density_infinity * T::from_f64(FALLBACK_DENSITY_FRACTION).unwrap();
        warn!(
            "Non-physical isentropic base {} for squared speed {}, using fallback density {}",
            base, v_norm2, density
        );
        Ok(DensityResponse {
            density,
            derivative: -density_infinity * density.powf((2.0 - gamma) / (gamma - 1.0)) / (2.0 * a * a),
            regime: DensityRegime::Fallback,
        })
    }
}

/// Pressure coefficient of the local velocity with respect to the free stream.
///
/// Uses the unclamped local speed. A non-positive isentropic base, which corresponds to a
/// local speed beyond the vacuum limit, is floored at zero.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn pressure_coefficient<T: Real>(
    conditions: &FlowConditions<T>,
    velocity: &DVector<T>,
) -> Result<T, ElementError> {
    conditions.ensure_populated()?;
    let vinfinity_norm2 = conditions.free_stream_velocity_squared();
    let gamma = conditions.heat_capacity_ratio;
    let a = conditions.sound_velocity;
    let v_norm2 = velocity.norm_squared();

    let mut base = 1.0 + (gamma - 1.0) * vinfinity_norm2 * (1.0 - v_norm2 / vinfinity_norm2) / (2.0 * a * a);
    if base <= 0.0 {
        warn!("Local squared speed {} exceeds the vacuum limit", v_norm2);
        base = 0.0;
    }

    Ok(2.0 * a * a * (base.powf(gamma / (gamma - 1.0)) - 1.0) / (gamma * vinfinity_norm2))
}
