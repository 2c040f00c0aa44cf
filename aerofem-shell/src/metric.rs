//! Surface metric of a curvilinear shell mid-surface.
use crate::{IntegrationPointData, Real};
use aerofem::nalgebra::{DMatrix, Matrix2, Matrix3, Scalar, Vector3};
use numeric_literals::replace_float_literals;

/// Index of $\vec g_{\alpha,\beta}$ among the columns of [`MetricVariables::hessian`].
pub fn hessian_index(alpha: usize, beta: usize) -> usize {
    match (alpha, beta) {
        (0, 0) => 0,
        (1, 1) => 1,
        _ => 2,
    }
}

/// Metric quantities at one point of the mid-surface.
///
/// Symmetric surface tensors are stored in the order $(11, 22, 12)$.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricVariables<T: Scalar> {
    /// Covariant base vector $\vec g_1 = \partial \vec x / \partial \xi_1$.
    pub g1: Vector3<T>,
    /// Covariant base vector $\vec g_2 = \partial \vec x / \partial \xi_2$.
    pub g2: Vector3<T>,
    /// Unit normal.
    pub g3: Vector3<T>,
    /// $\vec g_1 \times \vec g_2$.
    pub g3_unnormalized: Vector3<T>,
    /// Differential area $|\vec g_1 \times \vec g_2|$.
    pub da: T,
    /// Covariant metric $g_{\alpha\beta}$.
    pub gab: Vector3<T>,
    /// Contravariant metric $g^{\alpha\beta}$.
    pub gab_con: Vector3<T>,
    /// Curvature $\kappa_{\alpha\beta} = \vec g_{\alpha,\beta} \cdot \vec g_3$.
    pub curvature: Vector3<T>,
    /// Columns $\vec g_{1,1}$, $\vec g_{2,2}$ and $\vec g_{1,2}$.
    pub hessian: Matrix3<T>,
}

impl<T: Real> MetricVariables<T> {
    /// Computes the metric at an integration point from the element's nodal positions.
    ///
    /// Returns `None` if the base vectors are parallel or the metric cannot be inverted.
    pub fn compute(point: &IntegrationPointData<T>, positions: &[Vector3<T>]) -> Option<Self> {
        debug_assert_eq!(point.num_nodes(), positions.len());
        let mut g1 = Vector3::zeros();
        let mut g2 = Vector3::zeros();
        let mut hessian = Matrix3::zeros();
        for (k, x) in positions.iter().enumerate() {
            g1 += x * point.shape_derivatives[(k, 0)];
            g2 += x * point.shape_derivatives[(k, 1)];
            for c in 0..3 {
                let mut column = hessian.column_mut(c);
                column += x * point.second_derivatives[(k, c)];
            }
        }

        let g3_unnormalized = g1.cross(&g2);
        let da = g3_unnormalized.norm();
        if da == T::zero() {
            return None;
        }
        let g3 = g3_unnormalized / da;

        let gab = Vector3::new(g1.dot(&g1), g2.dot(&g2), g1.dot(&g2));
        let covariant = Matrix2::new(gab[0], gab[2], gab[2], gab[1]);
        let contravariant = covariant.try_inverse()?;
        let gab_con = Vector3::new(contravariant[(0, 0)], contravariant[(1, 1)], contravariant[(0, 1)]);

        let curvature = Vector3::new(
            hessian.column(0).dot(&g3),
            hessian.column(1).dot(&g3),
            hessian.column(2).dot(&g3),
        );

        Some(Self {
            g1,
            g2,
            g3,
            g3_unnormalized,
            da,
            gab,
            gab_con,
            curvature,
            hessian,
        })
    }

    /// The covariant base vector $\vec g_\alpha$.
    pub fn base(&self, alpha: usize) -> Vector3<T> {
        if alpha == 0 {
            self.g1
        } else {
            self.g2
        }
    }

    /// The parametric derivative $\vec g_{\alpha,\beta}$ of a covariant base vector.
    pub fn base_derivative(&self, alpha: usize, beta: usize) -> Vector3<T> {
        self.hessian.column(hessian_index(alpha, beta)).into_owned()
    }

    /// Contravariant base vectors $\vec g^1$ and $\vec g^2$.
    pub fn contravariant_bases(&self) -> (Vector3<T>, Vector3<T>) {
        let [g11, g22, g12] = [self.gab_con[0], self.gab_con[1], self.gab_con[2]];
        (self.g1 * g11 + self.g2 * g12, self.g1 * g12 + self.g2 * g22)
    }

    /// Matrix mapping curvilinear strain components to Cartesian Voigt strain.
    ///
    /// The local Cartesian frame is $\vec e_1 = \vec g_1 / |\vec g_1|$,
    /// $\vec e_2 = \vec g^2 / |\vec g^2|$. Curvilinear strains are tensor components
    /// $(E_{11}, E_{22}, E_{12}, E_{23}, E_{13})$, Cartesian strains use engineering shear
    /// $(\varepsilon_{11}, \varepsilon_{22}, \gamma_{12}, \gamma_{23}, \gamma_{13})$.
    /// `strain_size` is 3 for membrane strains and 5 when transverse shear is included.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn strain_transformation(&self, strain_size: usize) -> DMatrix<T> {
        let (g_con1, g_con2) = self.contravariant_bases();
        let e1 = self.g1.normalize();
        let e2 = g_con2.normalize();
        // l[(alpha, i)] = g^alpha . e_i
        let l = Matrix2::new(g_con1.dot(&e1), g_con1.dot(&e2), g_con2.dot(&e1), g_con2.dot(&e2));

        let mut q = DMatrix::zeros(strain_size, strain_size);
        for (row, (i, j)) in [(0, 0), (1, 1), (0, 1)].into_iter().enumerate() {
            let scale = if i == j { 1.0 } else { 2.0 };
            q[(row, 0)] = scale * l[(0, i)] * l[(0, j)];
            q[(row, 1)] = scale * l[(1, i)] * l[(1, j)];
            q[(row, 2)] = scale * (l[(0, i)] * l[(1, j)] + l[(1, i)] * l[(0, j)]);
        }
        if strain_size == 5 {
            // gamma_23 from (E_23, E_13) and gamma_13 likewise
            q[(3, 3)] = 2.0 * l[(1, 1)];
            q[(3, 4)] = 2.0 * l[(0, 1)];
            q[(4, 3)] = 2.0 * l[(1, 0)];
            q[(4, 4)] = 2.0 * l[(0, 0)];
        }
        q
    }
}
