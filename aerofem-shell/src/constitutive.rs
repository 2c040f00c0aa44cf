//! Constitutive laws and their coupling to element strain measures.
use crate::Real;
use aerofem::nalgebra::{DMatrix, DVector, Scalar};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// Stress and material tangent for a given strain.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialResponse<T: Scalar> {
    pub stress: DVector<T>,
    pub tangent: DMatrix<T>,
}

/// A constitutive law working on Cartesian Voigt strains.
///
/// Three dimensional laws use the component order $(11, 22, 33, 12, 23, 13)$ with
/// engineering shear strains, plane laws use $(11, 22, 12)$.
pub trait ConstitutiveLaw<T: Real>: Send + Sync {
    fn strain_size(&self) -> usize;

    fn calculate_material_response(&self, strain: &DVector<T>) -> MaterialResponse<T>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoungPoisson<T> {
    pub young: T,
    pub poisson: T,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LameParameters<T> {
    pub mu: T,
    pub lambda: T,
}

impl<T: Real> From<YoungPoisson<T>> for LameParameters<T> {
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn from(params: YoungPoisson<T>) -> Self {
        let YoungPoisson { young, poisson } = params;
        let mu = 0.5 * young / (1.0 + poisson);
        let lambda = 2.0 * mu * poisson / (1.0 - 2.0 * poisson);
        Self { mu, lambda }
    }
}

/// Linear elastic plane stress law (St. Venant-Kirchhoff on the surface).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearElasticPlaneStress<T> {
    pub parameters: YoungPoisson<T>,
}

impl<T: Real> LinearElasticPlaneStress<T> {
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn tangent(&self) -> DMatrix<T> {
        let YoungPoisson { young, poisson } = self.parameters;
        let c = young / (1.0 - poisson * poisson);
        DMatrix::from_row_slice(
            3,
            3,
            &[c, c * poisson, 0.0, c * poisson, c, 0.0, 0.0, 0.0, c * 0.5 * (1.0 - poisson)],
        )
    }
}

impl<T: Real> ConstitutiveLaw<T> for LinearElasticPlaneStress<T> {
    fn strain_size(&self) -> usize {
        3
    }

    fn calculate_material_response(&self, strain: &DVector<T>) -> MaterialResponse<T> {
        let tangent = self.tangent();
        MaterialResponse {
            stress: &tangent * strain,
            tangent,
        }
    }
}

/// Isotropic linear elastic law in three dimensions.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearElastic3d<T> {
    pub parameters: YoungPoisson<T>,
}

impl<T: Real> LinearElastic3d<T> {
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn tangent(&self) -> DMatrix<T> {
        let LameParameters { mu, lambda } = LameParameters::from(self.parameters);
        let mut tangent = DMatrix::zeros(6, 6);
        for i in 0..3 {
            for j in 0..3 {
                tangent[(i, j)] = lambda;
            }
            tangent[(i, i)] += 2.0 * mu;
            tangent[(i + 3, i + 3)] = mu;
        }
        tangent
    }
}

impl<T: Real> ConstitutiveLaw<T> for LinearElastic3d<T> {
    fn strain_size(&self) -> usize {
        6
    }

    fn calculate_material_response(&self, strain: &DVector<T>) -> MaterialResponse<T> {
        let tangent = self.tangent();
        MaterialResponse {
            stress: &tangent * strain,
            tangent,
        }
    }
}

/// Index of the transverse normal component in three dimensional Voigt order.
pub const TRANSVERSE_NORMAL_INDEX: usize = 2;

/// Eliminates the transverse normal stress from a three dimensional tangent.
///
/// Rows and columns in `kept` are retained, in that order, after the static condensation
/// $D_{ij} - D_{i3} D_{3j} / D_{33}$.
pub fn condense_transverse_normal<T: Real>(tangent: &DMatrix<T>, kept: &[usize]) -> DMatrix<T> {
    let k = TRANSVERSE_NORMAL_INDEX;
    let d_kk = tangent[(k, k)];
    DMatrix::from_fn(kept.len(), kept.len(), |i, j| {
        let (i, j) = (kept[i], kept[j]);
        tangent[(i, j)] - tangent[(i, k)] * tangent[(k, j)] / d_kk
    })
}

/// Removes the transverse normal stress of a response evaluated at vanishing transverse
/// normal strain, to first order: $S_i - D_{i3} S_3 / D_{33}$ for `i` in `kept`.
///
/// Exact for linear laws, where it equals the condensed tangent times the strain.
pub fn condense_transverse_normal_stress<T: Real>(response: &MaterialResponse<T>, kept: &[usize]) -> DVector<T> {
    let k = TRANSVERSE_NORMAL_INDEX;
    let (tangent, stress) = (&response.tangent, &response.stress);
    DVector::from_iterator(
        kept.len(),
        kept.iter()
            .map(|&i| stress[i] - tangent[(i, k)] * stress[k] / tangent[(k, k)]),
    )
}

/// How element strains are passed to a constitutive law.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialCoupling {
    /// The law works on the element strain vector directly.
    Direct,
    /// The law is three dimensional. The element strain occupies the `kept` Voigt
    /// components, the transverse normal stress is condensed out.
    Condensed { kept: Vec<usize> },
}

impl MaterialCoupling {
    /// Chooses the coupling for a law and an element strain size, if one exists.
    pub fn select(element_strain_size: usize, law_strain_size: usize) -> Option<Self> {
        match (element_strain_size, law_strain_size) {
            (e, l) if e == l => Some(MaterialCoupling::Direct),
            (3, 6) => Some(MaterialCoupling::Condensed { kept: vec![0, 1, 3] }),
            (5, 6) => Some(MaterialCoupling::Condensed {
                kept: vec![0, 1, 3, 4, 5],
            }),
            _ => None,
        }
    }

    /// Evaluates the law for a Cartesian element strain.
    pub fn evaluate<T: Real>(&self, law: &dyn ConstitutiveLaw<T>, strain: &DVector<T>) -> MaterialResponse<T> {
        match self {
            MaterialCoupling::Direct => law.calculate_material_response(strain),
            MaterialCoupling::Condensed { kept } => {
                let mut full_strain = DVector::zeros(law.strain_size());
                for (&index, &value) in kept.iter().zip(strain.iter()) {
                    full_strain[index] = value;
                }
                let response = law.calculate_material_response(&full_strain);
                MaterialResponse {
                    stress: condense_transverse_normal_stress(&response, kept),
                    tangent: condense_transverse_normal(&response.tangent, kept),
                }
            }
        }
    }
}
