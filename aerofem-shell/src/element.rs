//! Geometrically nonlinear membrane and shell element.
use crate::constitutive::{ConstitutiveLaw, MaterialCoupling, MaterialResponse};
use crate::error::ShellError;
use crate::formulation::ShellFormulation;
use crate::kinematics::Kinematics;
use crate::metric::MetricVariables;
use crate::node::{ShellDof, ShellDofHandle, ShellNode};
use crate::{IntegrationPointData, Real};
use aerofem::nalgebra::{DMatrix, DVector, Scalar, Vector2, Vector3};
use aerofem::LocalSystem;
use itertools::izip;
use log::debug;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellProperties<T: Scalar> {
    pub thickness: T,
    /// Cartesian membrane stress $(S_{11}, S_{22}, S_{12})$ added to the material stress.
    /// Membranes only.
    #[serde(default)]
    pub prestress: Option<Vector3<T>>,
}

impl<T: Real> ShellProperties<T> {
    pub fn with_thickness(thickness: T) -> Self {
        Self {
            thickness,
            prestress: None,
        }
    }
}

/// Linear and geometric stiffness together with the residual, kept apart.
#[derive(Debug, Clone, PartialEq)]
pub struct StiffnessContributions<T: Scalar> {
    /// $\int B^T D B \, dV$.
    pub linear: DMatrix<T>,
    /// $\int S : \partial^2 E \, dV$.
    pub geometric: DMatrix<T>,
    /// $-\int B^T S \, dV$.
    pub rhs: DVector<T>,
}

impl<T: Real> StiffnessContributions<T> {
    fn zeros(size: usize) -> Self {
        Self {
            linear: DMatrix::zeros(size, size),
            geometric: DMatrix::zeros(size, size),
            rhs: DVector::zeros(size),
        }
    }
}

impl<T: Real> From<StiffnessContributions<T>> for LocalSystem<T> {
    fn from(contributions: StiffnessContributions<T>) -> Self {
        Self {
            lhs: contributions.linear + contributions.geometric,
            rhs: contributions.rhs,
        }
    }
}

#[derive(Debug, Clone)]
struct InitialState<T: Scalar> {
    metrics: Vec<MetricVariables<T>>,
    /// Strain transformation per integration point.
    transformations: Vec<DMatrix<T>>,
    coupling: MaterialCoupling,
}

/// A total Lagrangian membrane or shell element on a curvilinear surface patch.
///
/// The element must be initialized with [`ShellElement::initialize`] before use, which
/// stores the metric of the reference configuration.
#[derive(Clone)]
pub struct ShellElement<T: Real> {
    pub id: usize,
    /// Indices into the node store.
    pub nodes: Vec<usize>,
    pub formulation: ShellFormulation,
    pub properties: ShellProperties<T>,
    integration_points: Vec<IntegrationPointData<T>>,
    law: Option<Arc<dyn ConstitutiveLaw<T>>>,
    initial_state: Option<InitialState<T>>,
}

impl<T: Real> ShellElement<T> {
    pub fn new(
        id: usize,
        nodes: Vec<usize>,
        integration_points: Vec<IntegrationPointData<T>>,
        formulation: ShellFormulation,
        properties: ShellProperties<T>,
    ) -> Self {
        Self {
            id,
            nodes,
            formulation,
            properties,
            integration_points,
            law: None,
            initial_state: None,
        }
    }

    pub fn with_constitutive_law(mut self, law: Arc<dyn ConstitutiveLaw<T>>) -> Self {
        self.set_constitutive_law(law);
        self
    }

    /// Assigns the law. The element has to be initialized again afterwards.
    pub fn set_constitutive_law(&mut self, law: Arc<dyn ConstitutiveLaw<T>>) {
        self.law = Some(law);
        self.initial_state = None;
    }

    pub fn integration_points(&self) -> &[IntegrationPointData<T>] {
        &self.integration_points
    }

    pub fn is_initialized(&self) -> bool {
        self.initial_state.is_some()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn local_system_size(&self) -> usize {
        self.num_nodes() * self.formulation.dofs_per_node()
    }

    fn element_nodes<'a>(&self, nodes: &'a [ShellNode<T>]) -> Result<Vec<&'a ShellNode<T>>, ShellError> {
        self.nodes
            .iter()
            .map(|&index| {
                nodes.get(index).ok_or(ShellError::MissingNode {
                    element: self.id,
                    node: index,
                })
            })
            .collect()
    }

    /// Validates the element and snapshots the metric of the reference configuration.
    pub fn initialize(&mut self, nodes: &[ShellNode<T>]) -> Result<(), ShellError> {
        let element = self.id;
        let law = self
            .law
            .as_ref()
            .ok_or(ShellError::MissingConstitutiveLaw { element })?;
        let strain_size = self.formulation.strain_size();
        let coupling =
            MaterialCoupling::select(strain_size, law.strain_size()).ok_or(ShellError::StrainSizeMismatch {
                element,
                element_strain_size: strain_size,
                law_strain_size: law.strain_size(),
            })?;
        if self.properties.prestress.is_some() && self.formulation != ShellFormulation::Membrane {
            return Err(ShellError::UnsupportedPrestress { element });
        }
        if self.integration_points.is_empty() {
            return Err(ShellError::NoIntegrationPoints { element });
        }

        let positions: Vec<_> = self
            .element_nodes(nodes)?
            .iter()
            .map(|node| node.reference_position)
            .collect();
        let mut metrics = Vec::with_capacity(self.integration_points.len());
        for (i, point) in self.integration_points.iter().enumerate() {
            if point.num_nodes() != positions.len() {
                return Err(ShellError::IntegrationPointMismatch {
                    element,
                    num_nodes: positions.len(),
                    num_shape_functions: point.num_nodes(),
                });
            }
            let metric =
                MetricVariables::compute(point, &positions).ok_or(ShellError::DegenerateMetric { element, point: i })?;
            metrics.push(metric);
        }
        let transformations = metrics
            .iter()
            .map(|metric| metric.strain_transformation(strain_size))
            .collect();

        debug!(
            "Initialized shell element {} ({:?}, {} integration points, {:?})",
            element,
            self.formulation,
            metrics.len(),
            coupling
        );
        self.initial_state = Some(InitialState {
            metrics,
            transformations,
            coupling,
        });
        Ok(())
    }

    /// Global equation ids in local dof order: node by node, displacements first.
    pub fn equation_ids(&self, nodes: &[ShellNode<T>]) -> Result<Vec<usize>, ShellError> {
        let mut ids = Vec::with_capacity(self.local_system_size());
        for node in self.element_nodes(nodes)? {
            for dof in &ShellDof::ALL[..self.formulation.dofs_per_node()] {
                let id = node.equation_ids[dof.index()].ok_or(ShellError::UnnumberedDof {
                    element: self.id,
                    node_id: node.id,
                })?;
                ids.push(id);
            }
        }
        Ok(ids)
    }

    pub fn dof_list(&self) -> Vec<ShellDofHandle> {
        self.nodes
            .iter()
            .flat_map(|&node| {
                ShellDof::ALL[..self.formulation.dofs_per_node()]
                    .iter()
                    .map(move |&dof| ShellDofHandle { node, dof })
            })
            .collect()
    }

    pub fn calculate_local_system(&self, nodes: &[ShellNode<T>]) -> Result<LocalSystem<T>, ShellError> {
        self.calculate_stiffness_contributions(nodes).map(LocalSystem::from)
    }

    pub fn calculate_stiffness_contributions(
        &self,
        nodes: &[ShellNode<T>],
    ) -> Result<StiffnessContributions<T>, ShellError> {
        self.integrate(nodes, true)
    }

    /// The residual alone. Skips all second variations.
    pub fn calculate_right_hand_side(&self, nodes: &[ShellNode<T>]) -> Result<DVector<T>, ShellError> {
        self.integrate(nodes, false).map(|contributions| contributions.rhs)
    }

    /// Cartesian mid-surface strains at every integration point.
    pub fn strains(&self, nodes: &[ShellNode<T>]) -> Result<Vec<DVector<T>>, ShellError> {
        self.mid_surface_states(nodes)
            .map(|states| states.into_iter().map(|(strain, _)| strain).collect())
    }

    /// Cartesian mid-surface stresses at every integration point, prestress included.
    pub fn stresses(&self, nodes: &[ShellNode<T>]) -> Result<Vec<DVector<T>>, ShellError> {
        self.mid_surface_states(nodes)
            .map(|states| states.into_iter().map(|(_, stress)| stress).collect())
    }

    fn initial_state(&self) -> Result<(&InitialState<T>, &dyn ConstitutiveLaw<T>), ShellError> {
        let element = self.id;
        let state = self
            .initial_state
            .as_ref()
            .ok_or(ShellError::NotInitialized { element })?;
        let law = self
            .law
            .as_deref()
            .ok_or(ShellError::MissingConstitutiveLaw { element })?;
        Ok((state, law))
    }

    fn current_configuration(&self, nodes: &[ShellNode<T>]) -> Result<(Vec<Vector3<T>>, Vec<Vector2<T>>), ShellError> {
        let element_nodes = self.element_nodes(nodes)?;
        let positions = element_nodes.iter().map(|node| node.current_position()).collect();
        let shear_differences = element_nodes.iter().map(|node| node.shear_difference).collect();
        Ok((positions, shear_differences))
    }

    fn material_response(
        &self,
        law: &dyn ConstitutiveLaw<T>,
        coupling: &MaterialCoupling,
        strain: &DVector<T>,
    ) -> MaterialResponse<T> {
        let mut response = coupling.evaluate(law, strain);
        if let Some(prestress) = &self.properties.prestress {
            let mut membrane_stress = response.stress.rows_mut(0, 3);
            membrane_stress += prestress;
        }
        response
    }

    fn mid_surface_states(&self, nodes: &[ShellNode<T>]) -> Result<Vec<(DVector<T>, DVector<T>)>, ShellError> {
        let (state, law) = self.initial_state()?;
        let (positions, shear_differences) = self.current_configuration(nodes)?;
        izip!(&self.integration_points, &state.metrics, &state.transformations)
            .enumerate()
            .map(|(i, (point, initial, q))| {
                let kinematics = Kinematics::compute(self.formulation, point, &positions, &shear_differences)
                    .ok_or(ShellError::DegenerateMetric {
                        element: self.id,
                        point: i,
                    })?;
                let strain = q * &kinematics.strain(initial).membrane;
                let stress = self.material_response(law, &state.coupling, &strain).stress;
                Ok((strain, stress))
            })
            .collect()
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn integrate(&self, nodes: &[ShellNode<T>], with_tangent: bool) -> Result<StiffnessContributions<T>, ShellError> {
        let (state, law) = self.initial_state()?;
        let (positions, shear_differences) = self.current_configuration(nodes)?;
        let thickness = self.properties.thickness;
        let thickness_points = self.formulation.thickness_points::<T>();
        let thickness_scale = self.formulation.thickness_scale(thickness);

        let mut contributions = StiffnessContributions::zeros(self.local_system_size());
        for (i, (point, initial, q)) in
            izip!(&self.integration_points, &state.metrics, &state.transformations).enumerate()
        {
            let kinematics = Kinematics::compute(self.formulation, point, &positions, &shear_differences).ok_or(
                ShellError::DegenerateMetric {
                    element: self.id,
                    point: i,
                },
            )?;
            let strain = kinematics.strain(initial);
            let first_variations = kinematics.first_variations();
            let second_variations = with_tangent.then(|| kinematics.second_variations());

            for thickness_point in &thickness_points {
                let scale = 0.5 * thickness_point.zeta * thickness;
                let weight = point.weight * thickness_point.weight * initial.da * thickness_scale;

                let b = q * first_variations.at(scale);
                let response = self.material_response(law, &state.coupling, &(q * strain.at(scale)));
                contributions.rhs -= b.tr_mul(&response.stress) * weight;

                if let Some(second_variations) = &second_variations {
                    contributions.linear += b.tr_mul(&(&response.tangent * &b)) * weight;
                    let curvilinear_stress = q.tr_mul(&response.stress) * weight;
                    contributions.geometric += second_variations.membrane.contract(&curvilinear_stress)
                        + second_variations.bending.contract(&(&curvilinear_stress * scale));
                }
            }
        }
        Ok(contributions)
    }
}
