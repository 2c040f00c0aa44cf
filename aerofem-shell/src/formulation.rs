//! Membrane and shell formulations.
use crate::Real;
use fenris_quadrature::univariate;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// Number of Gauss points through the thickness of bending formulations.
pub const SHELL_THICKNESS_POINTS: usize = 3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShellFormulation {
    /// Membrane strains only.
    Membrane,
    /// Membrane and bending strains with the normal as director.
    KirchhoffLove,
    /// Kirchhoff-Love kinematics enriched by a hierarchic shear difference vector,
    /// giving transverse shear strains.
    ReissnerMindlin,
}

/// A point of the through-thickness rule: the normalized thickness coordinate
/// $\zeta \in [-1, 1]$ and its quadrature weight.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ThicknessPoint<T> {
    pub zeta: T,
    pub weight: T,
}

impl ShellFormulation {
    pub fn dofs_per_node(&self) -> usize {
        match self {
            ShellFormulation::Membrane | ShellFormulation::KirchhoffLove => 3,
            ShellFormulation::ReissnerMindlin => 5,
        }
    }

    pub fn strain_size(&self) -> usize {
        match self {
            ShellFormulation::Membrane | ShellFormulation::KirchhoffLove => 3,
            ShellFormulation::ReissnerMindlin => 5,
        }
    }

    pub fn has_bending(&self) -> bool {
        !matches!(self, ShellFormulation::Membrane)
    }

    pub fn has_shear(&self) -> bool {
        matches!(self, ShellFormulation::ReissnerMindlin)
    }

    /// Through-thickness quadrature: a single mid-surface point for membranes,
    /// [`SHELL_THICKNESS_POINTS`] point Gauss-Legendre otherwise. Weights sum to 2 for shells.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn thickness_points<T: Real>(&self) -> Vec<ThicknessPoint<T>> {
        if self.has_bending() {
            let (weights, points) = univariate::gauss(SHELL_THICKNESS_POINTS);
            points
                .iter()
                .zip(&weights)
                .map(|(&[zeta], &weight)| ThicknessPoint {
                    zeta: T::from_f64(zeta).unwrap(),
                    weight: T::from_f64(weight).unwrap(),
                })
                .collect()
        } else {
            vec![ThicknessPoint { zeta: 0.0, weight: 1.0 }]
        }
    }

    /// Factor converting a through-thickness weight times the differential area into
    /// the integration weight: $t$ for membranes, $t/2$ for shells.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn thickness_scale<T: Real>(&self, thickness: T) -> T {
        if self.has_bending() {
            0.5 * thickness
        } else {
            thickness
        }
    }
}
