//! Geometry data for linear simplices.
use crate::Real;
use nalgebra::{DMatrix, DVector, Scalar, Vector3};
use numeric_literals::replace_float_literals;

/// The linear simplex types a potential flow element can be built on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SimplexGeometry {
    Triangle3,
    Tetrahedron4,
}

impl SimplexGeometry {
    pub fn from_num_nodes(num_nodes: usize) -> Option<Self> {
        match num_nodes {
            3 => Some(SimplexGeometry::Triangle3),
            4 => Some(SimplexGeometry::Tetrahedron4),
            _ => None,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.dim() + 1
    }

    pub fn dim(&self) -> usize {
        match self {
            SimplexGeometry::Triangle3 => 2,
            SimplexGeometry::Tetrahedron4 => 3,
        }
    }

    /// Collects the first `dim` coordinates of each vertex into the rows of a matrix.
    pub fn coordinate_matrix<T: Real>(&self, positions: &[Vector3<T>]) -> DMatrix<T> {
        assert_eq!(positions.len(), self.num_nodes());
        DMatrix::from_fn(self.num_nodes(), self.dim(), |i, j| positions[i][j])
    }

    /// The Jacobian of the affine map from the reference simplex, with columns `x_i - x_0`.
    fn jacobian<T: Real>(&self, coordinates: &DMatrix<T>) -> DMatrix<T> {
        let dim = self.dim();
        DMatrix::from_fn(dim, dim, |i, j| coordinates[(j + 1, i)] - coordinates[(0, i)])
    }

    /// Signed measure (area or volume) of the simplex. Negative for inverted vertex ordering.
    pub fn signed_volume<T: Real>(&self, coordinates: &DMatrix<T>) -> T {
        let det = self.jacobian(coordinates).determinant();
        match self {
            SimplexGeometry::Triangle3 => det / T::from_f64(2.0).unwrap(),
            SimplexGeometry::Tetrahedron4 => det / T::from_f64(6.0).unwrap(),
        }
    }
}

/// Shape function values, gradients and measure of a linear simplex.
///
/// Linear simplices have constant gradients, so a single evaluation at the centroid
/// describes the whole element.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryData<T: Scalar> {
    /// Shape function values at the centroid.
    pub shape_values: DVector<T>,
    /// Physical shape function gradients, one row per node.
    pub shape_gradients: DMatrix<T>,
    /// Signed measure of the element.
    pub volume: T,
}

impl<T: Real> GeometryData<T> {
    /// Returns `None` if the simplex is degenerate.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn compute(geometry: SimplexGeometry, coordinates: &DMatrix<T>) -> Option<Self> {
        let n = geometry.num_nodes();
        let dim = geometry.dim();
        let jacobian_inverse = geometry.jacobian(coordinates).try_inverse()?;

        // Reference gradients: N_0 = 1 - sum(xi), N_i = xi_i
        let mut reference_gradients = DMatrix::zeros(n, dim);
        for j in 0..dim {
            reference_gradients[(0, j)] = -1.0;
            reference_gradients[(j + 1, j)] = 1.0;
        }

        Some(Self {
            shape_values: DVector::repeat(n, T::one() / T::from_usize(n).unwrap()),
            shape_gradients: reference_gradients * jacobian_inverse,
            volume: geometry.signed_volume(coordinates),
        })
    }

    /// Gradient of the field interpolating the nodal values `values`.
    pub fn gradient(&self, values: &DVector<T>) -> DVector<T> {
        self.shape_gradients.tr_mul(values)
    }
}
