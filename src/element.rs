//! The wake-aware compressible potential flow element.
use crate::density::{compute_density, pressure_coefficient};
use crate::error::ElementError;
use crate::geometry::{GeometryData, SimplexGeometry};
use crate::node::{DofHandle, PotentialFace, PotentialNode};
use crate::settings::FlowConditions;
use crate::subdivision::{ElementSubdivision, PartitionSign, SimplexSubdivision};
use crate::wake::{ElementKind, WakeElementData};
use crate::{LocalSystem, Real};
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector, Scalar};
use numeric_literals::replace_float_literals;

/// Largest tolerated difference of the squared speeds on both sides of the wake.
pub const WAKE_SPEED_TOLERANCE: f64 = 0.1;

/// Linear simplex element for the full potential equation.
///
/// A normal element has one unknown per node, the positive-face potential. A wake element
/// has the positive- and negative-face potentials of every node; the nodal distances to the
/// wake decide which of them describes the flow above and below the wake.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialFlowElement<T: Scalar> {
    pub id: usize,
    /// Indices into the node store.
    pub nodes: Vec<usize>,
    /// Free-stream density. Used as the frozen density of incompressible computations.
    pub density: T,
    /// Forces the one-sided trailing edge coupling when the element is a wake element.
    pub boundary: bool,
    kind: ElementKind<T>,
}

/// Element data gathered for one local computation.
struct GatheredElement<'a, T: Scalar> {
    nodes: Vec<&'a PotentialNode<T>>,
    geometry: SimplexGeometry,
    coordinates: DMatrix<T>,
    data: GeometryData<T>,
}

/// Tangent and residual operator of one side of a wake element (or a normal element).
struct SideMatrices<T: Scalar> {
    lhs: DMatrix<T>,
    laplacian: DMatrix<T>,
}

impl<T: Real> SideMatrices<T> {
    fn zeros(n: usize) -> Self {
        Self {
            lhs: DMatrix::zeros(n, n),
            laplacian: DMatrix::zeros(n, n),
        }
    }
}

impl<T: Real> PotentialFlowElement<T> {
    pub fn new(id: usize, nodes: Vec<usize>, density: T) -> Self {
        Self {
            id,
            nodes,
            density,
            boundary: false,
            kind: ElementKind::Normal,
        }
    }

    pub fn with_boundary(self, boundary: bool) -> Self {
        Self { boundary, ..self }
    }

    pub fn kind(&self) -> &ElementKind<T> {
        &self.kind
    }

    pub fn wake_data(&self) -> Option<&WakeElementData<T>> {
        match &self.kind {
            ElementKind::Normal => None,
            ElementKind::Wake(wake) => Some(wake),
        }
    }

    pub fn is_wake(&self) -> bool {
        self.wake_data().is_some()
    }

    /// Turns the element into a wake element with the given nodal distances.
    ///
    /// A boundary element always gets the one-sided trailing edge coupling.
    pub fn make_wake(&mut self, distances: Vec<T>, trailing_edge: bool) -> Result<(), ElementError> {
        if distances.len() != self.nodes.len() {
            return Err(ElementError::WakeDistanceMismatch {
                element: self.id,
                expected: self.nodes.len(),
                actual: distances.len(),
            });
        }
        self.kind = ElementKind::Wake(WakeElementData::new(distances, trailing_edge || self.boundary));
        Ok(())
    }

    pub fn make_normal(&mut self) {
        self.kind = ElementKind::Normal;
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of rows of the local system, `N` for normal and `2N` for wake elements.
    pub fn local_system_size(&self) -> usize {
        if self.is_wake() {
            2 * self.num_nodes()
        } else {
            self.num_nodes()
        }
    }

    pub fn geometry(&self) -> Result<SimplexGeometry, ElementError> {
        SimplexGeometry::from_num_nodes(self.nodes.len()).ok_or(ElementError::UnsupportedGeometry {
            element: self.id,
            num_nodes: self.nodes.len(),
        })
    }

    fn element_nodes<'a>(&self, nodes: &'a [PotentialNode<T>]) -> Result<Vec<&'a PotentialNode<T>>, ElementError> {
        self.nodes
            .iter()
            .map(|&index| {
                nodes.get(index).ok_or(ElementError::MissingNode {
                    element: self.id,
                    node: index,
                })
            })
            .collect()
    }

    fn gather<'a>(&self, nodes: &'a [PotentialNode<T>]) -> Result<GatheredElement<'a, T>, ElementError> {
        let geometry = self.geometry()?;
        let nodes = self.element_nodes(nodes)?;
        let positions: Vec<_> = nodes.iter().map(|node| node.position).collect();
        let coordinates = geometry.coordinate_matrix(&positions);
        let data = GeometryData::compute(geometry, &coordinates)
            .ok_or(ElementError::NonPositiveVolume { element: self.id })?;
        Ok(GatheredElement {
            nodes,
            geometry,
            coordinates,
            data,
        })
    }

    /// Shape functions, gradients and measure of the element.
    pub fn geometry_data(&self, nodes: &[PotentialNode<T>]) -> Result<GeometryData<T>, ElementError> {
        Ok(self.gather(nodes)?.data)
    }

    /// The nodal unknowns in the order of the rows of the local system.
    pub fn dof_list(&self) -> Vec<DofHandle> {
        match &self.kind {
            ElementKind::Normal => self
                .nodes
                .iter()
                .map(|&node| DofHandle {
                    node,
                    face: PotentialFace::Positive,
                })
                .collect(),
            ElementKind::Wake(wake) => {
                let upper = self.nodes.iter().enumerate().map(|(i, &node)| DofHandle {
                    node,
                    face: wake.upper_face(i),
                });
                let lower = self.nodes.iter().enumerate().map(|(i, &node)| DofHandle {
                    node,
                    face: wake.lower_face(i),
                });
                upper.chain(lower).collect()
            }
        }
    }

    /// Global equation ids in the order of [`dof_list`](Self::dof_list).
    pub fn equation_ids(&self, nodes: &[PotentialNode<T>]) -> Result<Vec<usize>, ElementError> {
        self.dof_list()
            .into_iter()
            .map(|handle| {
                let node = nodes.get(handle.node).ok_or(ElementError::MissingNode {
                    element: self.id,
                    node: handle.node,
                })?;
                node.dof(handle.face)
                    .equation_id
                    .ok_or(ElementError::UnnumberedDof {
                        element: self.id,
                        node_id: node.id,
                    })
            })
            .collect()
    }

    /// One-time validation of the element and the flow conditions.
    pub fn check(&self, nodes: &[PotentialNode<T>], conditions: &FlowConditions<T>) -> Result<(), ElementError> {
        if self.id < 1 {
            return Err(ElementError::InvalidId { element: self.id });
        }
        conditions.validate()?;

        let geometry = self.geometry()?;
        let element_nodes = self.element_nodes(nodes)?;
        let positions: Vec<_> = element_nodes.iter().map(|node| node.position).collect();
        let volume = geometry.signed_volume(&geometry.coordinate_matrix(&positions));
        if volume <= T::zero() {
            return Err(ElementError::NonPositiveVolume { element: self.id });
        }

        self.equation_ids(nodes).map(|_| ())
    }

    /// Computes the local tangent and residual, sub-dividing wake elements exactly.
    pub fn calculate_local_system(
        &self,
        nodes: &[PotentialNode<T>],
        conditions: &FlowConditions<T>,
    ) -> Result<LocalSystem<T>, ElementError> {
        self.calculate_local_system_with(nodes, conditions, &SimplexSubdivision)
    }

    /// Same as [`calculate_local_system`](Self::calculate_local_system), but wake elements are
    /// partitioned by the given sub-division.
    pub fn calculate_local_system_with(
        &self,
        nodes: &[PotentialNode<T>],
        conditions: &FlowConditions<T>,
        subdivision: &dyn ElementSubdivision<T>,
    ) -> Result<LocalSystem<T>, ElementError> {
        let element = self.gather(nodes)?;
        match &self.kind {
            ElementKind::Normal => self.normal_system(&element, conditions),
            ElementKind::Wake(wake) => self.wake_system(&element, wake, conditions, subdivision),
        }
    }

    pub fn calculate_right_hand_side(
        &self,
        nodes: &[PotentialNode<T>],
        conditions: &FlowConditions<T>,
    ) -> Result<DVector<T>, ElementError> {
        Ok(self.calculate_local_system(nodes, conditions)?.rhs)
    }

    fn normal_system(
        &self,
        element: &GatheredElement<T>,
        conditions: &FlowConditions<T>,
    ) -> Result<LocalSystem<T>, ElementError> {
        let phi = gather_potentials(&element.nodes, |_| PotentialFace::Positive);
        let side = self.side_matrices(&element.data, element.data.volume, &phi, conditions)?;
        let rhs = if conditions.compressible {
            -(&side.laplacian * &phi)
        } else {
            -(&side.lhs * &phi)
        };
        Ok(LocalSystem { lhs: side.lhs, rhs })
    }

    /// Operators integrated over a region of the element with measure `volume`.
    ///
    /// The compressible tangent carries a convective term that the residual operator
    /// (`laplacian`) does not.
    fn side_matrices(
        &self,
        data: &GeometryData<T>,
        volume: T,
        phi: &DVector<T>,
        conditions: &FlowConditions<T>,
    ) -> Result<SideMatrices<T>, ElementError> {
        let dn_dx = &data.shape_gradients;
        let stiffness = dn_dx * dn_dx.transpose();
        if conditions.compressible {
            let velocity = data.gradient(phi);
            let response = compute_density(conditions, self.density, &velocity)?;
            let laplacian = &stiffness * (volume * response.density);
            let dnv = dn_dx * &velocity;
            let lhs = &laplacian + &dnv * dnv.transpose() * (volume * response.derivative);
            Ok(SideMatrices { lhs, laplacian })
        } else {
            let laplacian = stiffness * (volume * self.density);
            Ok(SideMatrices {
                lhs: laplacian.clone(),
                laplacian,
            })
        }
    }

    fn wake_system(
        &self,
        element: &GatheredElement<T>,
        wake: &WakeElementData<T>,
        conditions: &FlowConditions<T>,
        subdivision: &dyn ElementSubdivision<T>,
    ) -> Result<LocalSystem<T>, ElementError> {
        let n = element.nodes.len();
        let partitions = subdivision
            .subdivide(element.geometry, &element.coordinates, &wake.distances)
            .map_err(|err| ElementError::Subdivision {
                element: self.id,
                reason: err.to_string(),
            })?;

        let upper_phi = gather_potentials(&element.nodes, |i| wake.upper_face(i));
        let lower_phi = gather_potentials(&element.nodes, |i| wake.lower_face(i));

        let mut positive = SideMatrices::zeros(n);
        let mut negative = SideMatrices::zeros(n);
        for partition in &partitions {
            let (phi, side) = match partition.sign {
                PartitionSign::Positive => (&upper_phi, &mut positive),
                PartitionSign::Negative => (&lower_phi, &mut negative),
            };
            let contribution = self.side_matrices(&element.data, partition.volume, phi, conditions)?;
            side.lhs += &contribution.lhs;
            side.laplacian += &contribution.laplacian;
        }

        if wake.trailing_edge {
            let node_ids: Vec<_> = element.nodes.iter().map(|node| node.id).collect();
            let flags: Vec<_> = element.nodes.iter().map(|node| node.flags).collect();
            info!(
                "Trailing edge element {} (boundary: {}) with nodes {:?} and flags {:?}",
                self.id, self.boundary, node_ids, flags
            );
        }

        let lhs = assemble_wake_operator(&positive.lhs, &negative.lhs, wake);
        let laplacian = assemble_wake_operator(&positive.laplacian, &negative.laplacian, wake);

        let split_phi = DVector::from_iterator(2 * n, upper_phi.iter().chain(lower_phi.iter()).copied());
        let rhs = if conditions.compressible {
            -(&laplacian * &split_phi)
        } else {
            -(&lhs * &split_phi)
        };

        Ok(LocalSystem { lhs, rhs })
    }

    /// Velocity in the element. For wake elements, the velocity above the wake.
    ///
    /// Logs a warning if the speeds on the two sides of a wake element differ by more
    /// than [`WAKE_SPEED_TOLERANCE`] in the squared norm.
    pub fn velocity(&self, nodes: &[PotentialNode<T>]) -> Result<DVector<T>, ElementError> {
        let element = self.gather(nodes)?;
        match &self.kind {
            ElementKind::Normal => {
                let phi = gather_potentials(&element.nodes, |_| PotentialFace::Positive);
                Ok(element.data.gradient(&phi))
            }
            ElementKind::Wake(wake) => {
                let upper = element
                    .data
                    .gradient(&gather_potentials(&element.nodes, |i| wake.upper_face(i)));
                let lower = element
                    .data
                    .gradient(&gather_potentials(&element.nodes, |i| wake.lower_face(i)));
                let jump = (upper.norm_squared() - lower.norm_squared()).abs();
                if jump > T::from_f64(WAKE_SPEED_TOLERANCE).unwrap() {
                    warn!(
                        "Wake condition not fulfilled in element {}: squared speed jump {}",
                        self.id, jump
                    );
                }
                Ok(upper)
            }
        }
    }

    /// Velocity below the wake. Equal to [`velocity`](Self::velocity) for normal elements.
    pub fn lower_side_velocity(&self, nodes: &[PotentialNode<T>]) -> Result<DVector<T>, ElementError> {
        let element = self.gather(nodes)?;
        let phi = match &self.kind {
            ElementKind::Normal => gather_potentials(&element.nodes, |_| PotentialFace::Positive),
            ElementKind::Wake(wake) => gather_potentials(&element.nodes, |i| wake.lower_face(i)),
        };
        Ok(element.data.gradient(&phi))
    }

    /// Pressure coefficient. Wake elements report the value below the wake.
    pub fn pressure_coefficient(
        &self,
        nodes: &[PotentialNode<T>],
        conditions: &FlowConditions<T>,
    ) -> Result<T, ElementError> {
        let velocity = self.lower_side_velocity(nodes)?;
        pressure_coefficient(conditions, &velocity)
    }

    /// Density from the closure. Wake elements report the value below the wake.
    pub fn local_density(
        &self,
        nodes: &[PotentialNode<T>],
        conditions: &FlowConditions<T>,
    ) -> Result<T, ElementError> {
        let element = self.gather(nodes)?;
        let phi = match &self.kind {
            ElementKind::Normal => gather_potentials(&element.nodes, |_| PotentialFace::Positive),
            ElementKind::Wake(wake) => gather_potentials(&element.nodes, |i| wake.lower_face(i)),
        };
        let response = compute_density(conditions, self.density, &element.data.gradient(&phi))?;
        debug!("Element {} density regime {:?}", self.id, response.regime);
        Ok(response.density)
    }
}

fn gather_potentials<T: Real>(nodes: &[&PotentialNode<T>], face: impl Fn(usize) -> PotentialFace) -> DVector<T> {
    DVector::from_iterator(
        nodes.len(),
        nodes.iter().enumerate().map(|(i, node)| node.potential(face(i))),
    )
}

/// Places the operators of both sides into the `2N x 2N` wake system.
///
/// The default layout is block diagonal. Rows of nodes below the wake (negative distance)
/// tie the lower unknown to the upper operator. Rows of nodes above the wake do the same
/// for the lower operator, unless the element carries the one-sided trailing edge coupling.
#[replace_float_literals(T::from_f64(literal).unwrap())]
fn assemble_wake_operator<T: Real>(
    positive: &DMatrix<T>,
    negative: &DMatrix<T>,
    wake: &WakeElementData<T>,
) -> DMatrix<T> {
    let n = positive.nrows();
    let mut matrix = DMatrix::zeros(2 * n, 2 * n);
    matrix.view_mut((0, 0), (n, n)).copy_from(positive);
    matrix.view_mut((n, n), (n, n)).copy_from(negative);

    for (i, &distance) in wake.distances.iter().enumerate() {
        if distance < 0.0 {
            for j in 0..n {
                matrix[(i, j)] = positive[(i, j)];
                matrix[(i, j + n)] = -positive[(i, j)];
            }
        }
    }

    for (i, &distance) in wake.distances.iter().enumerate() {
        if distance > 0.0 {
            for j in 0..n {
                matrix[(i + n, j + n)] = negative[(i, j)];
                if !wake.trailing_edge {
                    matrix[(i + n, j)] = -negative[(i, j)];
                }
            }
        }
    }

    matrix
}
