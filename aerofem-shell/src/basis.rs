//! Tensor product Lagrange bases on the parametric square $[-1, 1]^2$.
//!
//! Nodes are numbered lexicographically with $\xi_1$ running fastest, i.e. node
//! `i + j * (degree + 1)` sits at the `i`-th node in $\xi_1$ and the `j`-th node in $\xi_2$.
use crate::{IntegrationPointData, Real};
use aerofem::nalgebra::{DMatrix, DVector};
use fenris_quadrature::{tensor, univariate};
use numeric_literals::replace_float_literals;

/// Gauss-Legendre points and weights on $[-1, 1]$. `None` for zero points.
pub fn gauss_legendre_1d<T: Real>(num_points: usize) -> Option<Vec<(T, T)>> {
    if num_points == 0 {
        return None;
    }
    let (weights, points) = univariate::gauss(num_points);
    Some(
        points
            .iter()
            .zip(&weights)
            .map(|(&[x], &w)| (T::from_f64(x).unwrap(), T::from_f64(w).unwrap()))
            .collect(),
    )
}

/// Values, first and second derivatives of the 1D Lagrange polynomials of the given
/// degree on equidistant nodes, evaluated at `x`.
#[replace_float_literals(T::from_f64(literal).unwrap())]
fn lagrange_1d<T: Real>(degree: usize, x: T) -> Option<[Vec<T>; 3]> {
    match degree {
        1 => Some([
            vec![0.5 * (1.0 - x), 0.5 * (1.0 + x)],
            vec![-0.5, 0.5],
            vec![0.0, 0.0],
        ]),
        2 => Some([
            vec![0.5 * x * (x - 1.0), 1.0 - x * x, 0.5 * x * (x + 1.0)],
            vec![x - 0.5, -2.0 * x, x + 0.5],
            vec![1.0, -2.0, 1.0],
        ]),
        _ => None,
    }
}

/// Evaluates the tensor product Lagrange basis of the given degree at a parametric point.
pub fn lagrange_quadrilateral<T: Real>(degree: usize, xi: [T; 2], weight: T) -> Option<IntegrationPointData<T>> {
    let [l1, d1, dd1] = lagrange_1d(degree, xi[0])?;
    let [l2, d2, dd2] = lagrange_1d(degree, xi[1])?;
    let n = (degree + 1) * (degree + 1);

    let mut shape_values = DVector::zeros(n);
    let mut shape_derivatives = DMatrix::zeros(n, 2);
    let mut second_derivatives = DMatrix::zeros(n, 3);
    for j in 0..=degree {
        for i in 0..=degree {
            let k = i + j * (degree + 1);
            shape_values[k] = l1[i] * l2[j];
            shape_derivatives[(k, 0)] = d1[i] * l2[j];
            shape_derivatives[(k, 1)] = l1[i] * d2[j];
            second_derivatives[(k, 0)] = dd1[i] * l2[j];
            second_derivatives[(k, 1)] = l1[i] * dd2[j];
            second_derivatives[(k, 2)] = d1[i] * d2[j];
        }
    }

    Some(IntegrationPointData {
        weight,
        shape_values,
        shape_derivatives,
        second_derivatives,
    })
}

/// Integration point data of a Lagrange quadrilateral of degree 1 or 2 with a
/// tensor Gauss rule of the given number of points per direction.
pub fn lagrange_quadrilateral_integration_points<T: Real>(
    degree: usize,
    points_per_direction: usize,
) -> Option<Vec<IntegrationPointData<T>>> {
    if points_per_direction == 0 {
        return None;
    }
    let (weights, points) = tensor::quadrilateral_gauss(points_per_direction);
    weights
        .iter()
        .zip(&points)
        .map(|(&w, &[x1, x2])| {
            let xi = [T::from_f64(x1).unwrap(), T::from_f64(x2).unwrap()];
            lagrange_quadrilateral(degree, xi, T::from_f64(w).unwrap())
        })
        .collect()
}
