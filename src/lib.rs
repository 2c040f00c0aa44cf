//! Finite element building blocks for compressible potential flow around lifting bodies.
//!
//! The velocity potential is discretized with linear simplices. Elements cut by the wake
//! sheet carry two potentials per node, one for each side of the discontinuity, and are
//! integrated over sign-consistent sub-partitions.
pub mod assembly;
pub mod density;
pub mod element;
pub mod error;
pub mod geometry;
pub mod gradient;
pub mod model;
pub mod node;
pub mod procedural;
pub mod settings;
pub mod subdivision;
pub mod wake;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

pub use aerofem_traits::Real;

/// A dense local tangent matrix together with the local residual.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSystem<T: nalgebra::Scalar> {
    pub lhs: nalgebra::DMatrix<T>,
    pub rhs: nalgebra::DVector<T>,
}

impl<T: Real> LocalSystem<T> {
    pub fn zeros(size: usize) -> Self {
        Self {
            lhs: nalgebra::DMatrix::zeros(size, size),
            rhs: nalgebra::DVector::zeros(size),
        }
    }

    pub fn size(&self) -> usize {
        self.rhs.len()
    }
}
