//! Strains of the shell mid-surface and their first and second variations with respect
//! to the element dofs.
//!
//! All quantities vary linearly through the thickness. They are split into a membrane
//! part and a bending part such that the value at the thickness coordinate $\zeta$ is
//! `membrane + zeta * t / 2 * bending`. Strain components are curvilinear tensor
//! components $(E_{11}, E_{22}, E_{12}, E_{23}, E_{13})$; the shear components are only
//! present for Reissner-Mindlin shells and live in the membrane part.
use crate::formulation::ShellFormulation;
use crate::metric::{hessian_index, MetricVariables};
use crate::{IntegrationPointData, Real};
use aerofem::nalgebra::{DMatrix, DVector, Matrix2, Scalar, Vector2, Vector3};
use numeric_literals::replace_float_literals;

/// In-plane strain components and their index pairs $(\alpha, \beta)$.
const IN_PLANE_COMPONENTS: [(usize, usize, usize); 3] = [(0, 0, 0), (1, 1, 1), (2, 0, 1)];
/// Transverse shear components and the base vector index they are measured along.
const SHEAR_COMPONENTS: [(usize, usize); 2] = [(3, 1), (4, 0)];

/// A single element dof in local ordering.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DofKind {
    Displacement { node: usize, direction: usize },
    ShearDifference { node: usize, direction: usize },
}

/// Local dofs of an element with `num_nodes` nodes, node by node.
pub fn dof_kinds(formulation: ShellFormulation, num_nodes: usize) -> Vec<DofKind> {
    (0..num_nodes)
        .flat_map(|node| {
            (0..formulation.dofs_per_node()).map(move |dof| {
                if dof < 3 {
                    DofKind::Displacement { node, direction: dof }
                } else {
                    DofKind::ShearDifference {
                        node,
                        direction: dof - 3,
                    }
                }
            })
        })
        .collect()
}

/// The shear difference vector $\vec w = w_1 \vec g_1 + w_2 \vec g_2$ and its parametric
/// derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct ShearDifferenceField<T: Scalar> {
    /// Interpolated $(w_1, w_2)$.
    pub coefficients: Vector2<T>,
    /// Entry $(\alpha, \beta)$ holds $\partial w_\alpha / \partial \xi_\beta$.
    pub coefficient_derivatives: Matrix2<T>,
    pub w: Vector3<T>,
    /// $\vec w_{,1}$ and $\vec w_{,2}$.
    pub derivatives: [Vector3<T>; 2],
}

impl<T: Real> ShearDifferenceField<T> {
    pub fn compute(point: &IntegrationPointData<T>, nodal_values: &[Vector2<T>], metric: &MetricVariables<T>) -> Self {
        let mut coefficients = Vector2::zeros();
        let mut coefficient_derivatives = Matrix2::zeros();
        for (k, value) in nodal_values.iter().enumerate() {
            coefficients += value * point.shape_values[k];
            for beta in 0..2 {
                let mut column = coefficient_derivatives.column_mut(beta);
                column += value * point.shape_derivatives[(k, beta)];
            }
        }

        let w = metric.g1 * coefficients[0] + metric.g2 * coefficients[1];
        let derivatives = [0, 1].map(|beta| {
            (0..2)
                .map(|alpha| {
                    metric.base(alpha) * coefficient_derivatives[(alpha, beta)]
                        + metric.base_derivative(alpha, beta) * coefficients[alpha]
                })
                .fold(Vector3::zeros(), |sum, term| sum + term)
        });

        Self {
            coefficients,
            coefficient_derivatives,
            w,
            derivatives,
        }
    }

    pub fn zero() -> Self {
        Self {
            coefficients: Vector2::zeros(),
            coefficient_derivatives: Matrix2::zeros(),
            w: Vector3::zeros(),
            derivatives: [Vector3::zeros(); 2],
        }
    }
}

/// First derivatives of the kinematic quantities with respect to a single dof.
#[derive(Debug, Clone, PartialEq)]
pub struct DofVariation<T: Scalar> {
    pub kind: DofKind,
    /// Variations of $\vec g_1$ and $\vec g_2$.
    pub dg: [Vector3<T>; 2],
    /// Variations of the Hessian columns $\vec g_{1,1}$, $\vec g_{2,2}$, $\vec g_{1,2}$.
    pub dh: [Vector3<T>; 3],
    /// Variation of $\vec g_1 \times \vec g_2$.
    pub da: Vector3<T>,
    /// Variation of the unit normal.
    pub dn: Vector3<T>,
    pub dw: Vector3<T>,
    /// Variations of $\vec w_{,1}$ and $\vec w_{,2}$.
    pub dw_derivatives: [Vector3<T>; 2],
}

impl<T: Real> DofVariation<T> {
    fn compute(
        kind: DofKind,
        point: &IntegrationPointData<T>,
        metric: &MetricVariables<T>,
        field: &ShearDifferenceField<T>,
    ) -> Self {
        let zero = Vector3::zeros();
        match kind {
            DofKind::Displacement { node, direction } => {
                let mut e = Vector3::zeros();
                e[direction] = T::one();
                let dg = [0, 1].map(|alpha| e * point.shape_derivatives[(node, alpha)]);
                let dh = [0, 1, 2].map(|c| e * point.second_derivatives[(node, c)]);

                let a = &metric.g3_unnormalized;
                let a_norm = metric.da;
                let da = dg[0].cross(&metric.g2) + metric.g1.cross(&dg[1]);
                let dn = da / a_norm - a * (a.dot(&da) / a_norm.powi(3));

                let w = &field.coefficients;
                let dw_derivatives = [0, 1].map(|beta| {
                    dg[0] * field.coefficient_derivatives[(0, beta)]
                        + dg[1] * field.coefficient_derivatives[(1, beta)]
                        + dh[hessian_index(0, beta)] * w[0]
                        + dh[hessian_index(1, beta)] * w[1]
                });

                Self {
                    kind,
                    dw: dg[0] * w[0] + dg[1] * w[1],
                    dg,
                    dh,
                    da,
                    dn,
                    dw_derivatives,
                }
            }
            DofKind::ShearDifference { node, direction } => {
                let n = point.shape_values[node];
                let base = metric.base(direction);
                let dw_derivatives = [0, 1].map(|beta| {
                    base * point.shape_derivatives[(node, beta)] + metric.base_derivative(direction, beta) * n
                });
                Self {
                    kind,
                    dg: [zero; 2],
                    dh: [zero; 3],
                    da: zero,
                    dn: zero,
                    dw: base * n,
                    dw_derivatives,
                }
            }
        }
    }
}

/// Curvilinear strain vector split into membrane and bending part.
#[derive(Debug, Clone, PartialEq)]
pub struct ThroughThickness<M> {
    pub membrane: M,
    /// Coefficient of $\zeta t / 2$.
    pub bending: M,
}

impl<T: Real> ThroughThickness<DVector<T>> {
    /// The value at `scale` $= \zeta t / 2$.
    pub fn at(&self, scale: T) -> DVector<T> {
        &self.membrane + &self.bending * scale
    }
}

impl<T: Real> ThroughThickness<DMatrix<T>> {
    /// The value at `scale` $= \zeta t / 2$.
    pub fn at(&self, scale: T) -> DMatrix<T> {
        &self.membrane + &self.bending * scale
    }
}

/// Second variations of every strain component, one symmetric dof-by-dof matrix each.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondVariations<T: Scalar> {
    pub components: Vec<DMatrix<T>>,
}

impl<T: Real> SecondVariations<T> {
    pub fn zeros(strain_size: usize, num_dofs: usize) -> Self {
        Self {
            components: vec![DMatrix::zeros(num_dofs, num_dofs); strain_size],
        }
    }

    pub fn num_dofs(&self) -> usize {
        self.components.first().map(|c| c.nrows()).unwrap_or(0)
    }

    /// Stores the value of a dof pair in both triangles.
    fn set_pair(&mut self, component: usize, r: usize, s: usize, value: T) {
        let matrix = &mut self.components[component];
        matrix[(r, s)] = value;
        matrix[(s, r)] = value;
    }

    /// Computes $\sum_c s_c \, \partial^2 E_c / \partial u_r \partial u_s$ for the given
    /// curvilinear stress.
    pub fn contract(&self, stress: &DVector<T>) -> DMatrix<T> {
        let n = self.num_dofs();
        self.components
            .iter()
            .zip(stress.iter())
            .fold(DMatrix::zeros(n, n), |sum, (component, &s)| sum + component * s)
    }
}

/// Actual kinematic state at one surface integration point together with the dof
/// variations.
#[derive(Debug, Clone)]
pub struct Kinematics<'a, T: Scalar> {
    formulation: ShellFormulation,
    point: &'a IntegrationPointData<T>,
    pub metric: MetricVariables<T>,
    pub shear_difference: ShearDifferenceField<T>,
    pub variations: Vec<DofVariation<T>>,
}

impl<'a, T: Real> Kinematics<'a, T> {
    /// Returns `None` if the actual metric is degenerate.
    pub fn compute(
        formulation: ShellFormulation,
        point: &'a IntegrationPointData<T>,
        positions: &[Vector3<T>],
        shear_differences: &[Vector2<T>],
    ) -> Option<Self> {
        let metric = MetricVariables::compute(point, positions)?;
        let shear_difference = if formulation.has_shear() {
            ShearDifferenceField::compute(point, shear_differences, &metric)
        } else {
            ShearDifferenceField::zero()
        };
        let variations = dof_kinds(formulation, positions.len())
            .into_iter()
            .map(|kind| DofVariation::compute(kind, point, &metric, &shear_difference))
            .collect();
        Some(Self {
            formulation,
            point,
            metric,
            shear_difference,
            variations,
        })
    }

    pub fn num_dofs(&self) -> usize {
        self.variations.len()
    }

    /// Curvilinear strains relative to the initial metric.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn strain(&self, initial: &MetricVariables<T>) -> ThroughThickness<DVector<T>> {
        let size = self.formulation.strain_size();
        let mut membrane = DVector::zeros(size);
        let mut bending = DVector::zeros(size);
        let metric = &self.metric;
        let field = &self.shear_difference;

        for (c, _, _) in IN_PLANE_COMPONENTS {
            membrane[c] = 0.5 * (metric.gab[c] - initial.gab[c]);
        }
        if self.formulation.has_bending() {
            for (c, alpha, beta) in IN_PLANE_COMPONENTS {
                bending[c] = initial.curvature[c] - metric.curvature[c];
                if self.formulation.has_shear() {
                    bending[c] += 0.5
                        * (field.derivatives[alpha].dot(&metric.base(beta))
                            + field.derivatives[beta].dot(&metric.base(alpha)));
                }
            }
        }
        if self.formulation.has_shear() {
            for (c, alpha) in SHEAR_COMPONENTS {
                membrane[c] = 0.5 * field.w.dot(&metric.base(alpha));
            }
        }

        ThroughThickness { membrane, bending }
    }

    /// First variations of the curvilinear strains, one column per dof.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn first_variations(&self) -> ThroughThickness<DMatrix<T>> {
        let size = self.formulation.strain_size();
        let mut membrane = DMatrix::zeros(size, self.num_dofs());
        let mut bending = DMatrix::zeros(size, self.num_dofs());
        let metric = &self.metric;
        let field = &self.shear_difference;

        for (r, v) in self.variations.iter().enumerate() {
            for (c, alpha, beta) in IN_PLANE_COMPONENTS {
                membrane[(c, r)] = 0.5 * (v.dg[alpha].dot(&metric.base(beta)) + metric.base(alpha).dot(&v.dg[beta]));
            }
            if self.formulation.has_bending() {
                for (c, alpha, beta) in IN_PLANE_COMPONENTS {
                    let d_curvature = v.dh[c].dot(&metric.g3) + metric.hessian.column(c).dot(&v.dn);
                    bending[(c, r)] = -d_curvature;
                    if self.formulation.has_shear() {
                        let d_term = |a: usize, b: usize| {
                            v.dw_derivatives[a].dot(&metric.base(b)) + field.derivatives[a].dot(&v.dg[b])
                        };
                        bending[(c, r)] += 0.5 * (d_term(alpha, beta) + d_term(beta, alpha));
                    }
                }
            }
            if self.formulation.has_shear() {
                for (c, alpha) in SHEAR_COMPONENTS {
                    membrane[(c, r)] = 0.5 * (v.dw.dot(&metric.base(alpha)) + field.w.dot(&v.dg[alpha]));
                }
            }
        }

        ThroughThickness { membrane, bending }
    }

    /// Second variations of the curvilinear strains.
    ///
    /// Only pairs `s <= r` are evaluated, the upper triangle is mirrored.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn second_variations(&self) -> ThroughThickness<SecondVariations<T>> {
        let size = self.formulation.strain_size();
        let mut membrane = SecondVariations::zeros(size, self.num_dofs());
        let mut bending = SecondVariations::zeros(size, self.num_dofs());
        let metric = &self.metric;

        for (r, vr) in self.variations.iter().enumerate() {
            for (s, vs) in self.variations.iter().enumerate().take(r + 1) {
                for (c, alpha, beta) in IN_PLANE_COMPONENTS {
                    let value = 0.5 * (vr.dg[alpha].dot(&vs.dg[beta]) + vs.dg[alpha].dot(&vr.dg[beta]));
                    membrane.set_pair(c, r, s, value);
                }

                if !self.formulation.has_bending() {
                    continue;
                }

                let ddn = self.normal_second_variation(vr, vs);
                let mixed = if self.formulation.has_shear() {
                    self.mixed_shear_difference_variation(vr, vs)
                } else {
                    None
                };

                for (c, alpha, beta) in IN_PLANE_COMPONENTS {
                    let dd_curvature = vr.dh[c].dot(&vs.dn)
                        + vs.dh[c].dot(&vr.dn)
                        + metric.hessian.column(c).dot(&ddn);
                    let mut value = -dd_curvature;
                    if self.formulation.has_shear() {
                        let dd_term = |a: usize, b: usize| {
                            let mixed_term = mixed
                                .as_ref()
                                .map(|(_, ddw_derivatives)| ddw_derivatives[a].dot(&metric.base(b)))
                                .unwrap_or(0.0);
                            mixed_term + vr.dw_derivatives[a].dot(&vs.dg[b]) + vs.dw_derivatives[a].dot(&vr.dg[b])
                        };
                        value += 0.5 * (dd_term(alpha, beta) + dd_term(beta, alpha));
                    }
                    bending.set_pair(c, r, s, value);
                }

                if self.formulation.has_shear() {
                    for (c, alpha) in SHEAR_COMPONENTS {
                        let mixed_term = mixed
                            .as_ref()
                            .map(|(ddw, _)| ddw.dot(&metric.base(alpha)))
                            .unwrap_or(0.0);
                        let value = 0.5 * (mixed_term + vr.dw.dot(&vs.dg[alpha]) + vs.dw.dot(&vr.dg[alpha]));
                        membrane.set_pair(c, r, s, value);
                    }
                }
            }
        }

        ThroughThickness { membrane, bending }
    }

    /// Second variation of the unit normal. Non-zero only for pairs of displacement dofs.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn normal_second_variation(&self, vr: &DofVariation<T>, vs: &DofVariation<T>) -> Vector3<T> {
        let both_displacements = matches!(
            (vr.kind, vs.kind),
            (DofKind::Displacement { .. }, DofKind::Displacement { .. })
        );
        if !both_displacements {
            return Vector3::zeros();
        }

        let a = &self.metric.g3_unnormalized;
        let a_norm = self.metric.da;
        let a_norm3 = a_norm.powi(3);
        let dda = vr.dg[0].cross(&vs.dg[1]) + vs.dg[0].cross(&vr.dg[1]);
        let a_dar = a.dot(&vr.da);
        let a_das = a.dot(&vs.da);

        dda / a_norm
            - vr.da * (a_das / a_norm3)
            - vs.da * (a_dar / a_norm3)
            - a * ((vs.da.dot(&vr.da) + a.dot(&dda)) / a_norm3)
            + a * (3.0 * a_dar * a_das / a_norm.powi(5))
    }

    /// Second variations of $\vec w$ and $\vec w_{,\beta}$ for a pair of one shear
    /// difference dof and one displacement dof. All other pairs vanish.
    fn mixed_shear_difference_variation(
        &self,
        vr: &DofVariation<T>,
        vs: &DofVariation<T>,
    ) -> Option<(Vector3<T>, [Vector3<T>; 2])> {
        let (node, alpha, displacement) = match (vr.kind, vs.kind) {
            (DofKind::ShearDifference { node, direction }, DofKind::Displacement { .. }) => (node, direction, vs),
            (DofKind::Displacement { .. }, DofKind::ShearDifference { node, direction }) => (node, direction, vr),
            _ => return None,
        };
        let n = self.point.shape_values[node];
        let dg = displacement.dg[alpha];
        let ddw = dg * n;
        let ddw_derivatives = [0, 1].map(|beta| {
            dg * self.point.shape_derivatives[(node, beta)] + displacement.dh[hessian_index(alpha, beta)] * n
        });
        Some((ddw, ddw_derivatives))
    }
}
