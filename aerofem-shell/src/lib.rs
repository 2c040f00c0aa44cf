//! Geometrically nonlinear membrane and shell elements.
//!
//! The elements are formulated in a total Lagrangian setting on curvilinear surface
//! coordinates $(\xi_1, \xi_2)$. Strains are measured as the difference between the
//! actual and the initial metric (and curvature), transformed into a local Cartesian
//! frame before they are handed to a constitutive law.
//!
//! Shape functions are supplied by an external basis evaluator in the form of
//! [`IntegrationPointData`]. [`basis`] provides tensor product Lagrange bases for
//! quadrilateral patches.
use aerofem::nalgebra::{DMatrix, DVector, Scalar};

pub mod assembly;
pub mod basis;
pub mod constitutive;
pub mod element;
pub mod error;
pub mod formulation;
pub mod kinematics;
pub mod metric;
pub mod model;
pub mod node;

pub use aerofem::Real;

/// Shape function data of a single surface integration point.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationPointData<T: Scalar> {
    /// Quadrature weight in parametric space.
    pub weight: T,
    /// Shape function values $N_k$.
    pub shape_values: DVector<T>,
    /// First derivatives $\partial N_k / \partial \xi_\alpha$, one row per node.
    pub shape_derivatives: DMatrix<T>,
    /// Second derivatives, one row per node, columns ordered as
    /// $(\xi_1 \xi_1, \xi_2 \xi_2, \xi_1 \xi_2)$.
    pub second_derivatives: DMatrix<T>,
}

impl<T: Real> IntegrationPointData<T> {
    pub fn num_nodes(&self) -> usize {
        self.shape_values.len()
    }
}
