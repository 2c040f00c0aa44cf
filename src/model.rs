//! A potential flow model: the node store, its elements and the wake preprocessing.
use crate::element::PotentialFlowElement;
use crate::node::{PotentialFace, PotentialNode};
use crate::settings::FlowConditions;
use crate::subdivision::PartitionSign;
use crate::wake::{is_trailing_edge_element, WakeSurface};
use crate::Real;
use eyre::{eyre, WrapErr};
use log::{debug, info};
use nalgebra::{DVector, Scalar, Vector3};

#[derive(Debug, Clone, PartialEq)]
pub struct PotentialFlowModel<T: Scalar> {
    pub nodes: Vec<PotentialNode<T>>,
    pub elements: Vec<PotentialFlowElement<T>>,
}

impl<T: Real> PotentialFlowModel<T> {
    pub fn new(nodes: Vec<PotentialNode<T>>, elements: Vec<PotentialFlowElement<T>>) -> Self {
        Self { nodes, elements }
    }

    /// Classifies every element as normal or wake element with respect to the given wake.
    ///
    /// An element becomes a wake element if the wake sheet cuts it and its centroid lies
    /// downstream of the trailing edge. Must complete before any assembly. Returns the number
    /// of wake elements.
    pub fn define_wake(&mut self, surface: &WakeSurface<T>) -> eyre::Result<usize> {
        let distances: Vec<T> = self
            .nodes
            .iter()
            .map(|node| surface.signed_distance(&node.position))
            .collect();

        let mut num_wake_elements = 0;
        let mut num_trailing_edge_elements = 0;
        for element in &mut self.elements {
            element.make_normal();

            let local_distances = element
                .nodes
                .iter()
                .map(|&index| {
                    distances
                        .get(index)
                        .copied()
                        .ok_or_else(|| eyre!("Element {} references missing node {}", element.id, index))
                })
                .collect::<eyre::Result<Vec<_>>>()?;

            let has_positive = local_distances
                .iter()
                .any(|&d| PartitionSign::of(d) == PartitionSign::Positive);
            let has_negative = local_distances
                .iter()
                .any(|&d| PartitionSign::of(d) == PartitionSign::Negative);
            if !(has_positive && has_negative) {
                continue;
            }

            let centroid = element
                .nodes
                .iter()
                .fold(Vector3::zeros(), |sum, &index| sum + self.nodes[index].position)
                / T::from_usize(element.nodes.len()).unwrap();
            if surface.downstream_distance(&centroid) <= T::zero() {
                continue;
            }

            let trailing_edge = is_trailing_edge_element(
                element.nodes.iter().map(|&index| self.nodes[index].flags),
                element.boundary,
            );
            element.make_wake(local_distances, trailing_edge)?;
            num_wake_elements += 1;
            if trailing_edge {
                num_trailing_edge_elements += 1;
            }
        }

        info!(
            "Wake defined: {} wake elements, {} of them at the trailing edge",
            num_wake_elements, num_trailing_edge_elements
        );
        Ok(num_wake_elements)
    }

    /// Assigns equation ids: first the positive face of every node, then the negative face
    /// of every node belonging to a wake element. Returns the number of equations.
    pub fn number_dofs(&mut self) -> usize {
        let mut on_wake = vec![false; self.nodes.len()];
        for element in self.elements.iter().filter(|element| element.is_wake()) {
            for &index in &element.nodes {
                if let Some(flag) = on_wake.get_mut(index) {
                    *flag = true;
                }
            }
        }

        let mut next = 0;
        for node in &mut self.nodes {
            node.positive_potential.equation_id = Some(next);
            next += 1;
        }
        for (node, &is_on_wake) in self.nodes.iter_mut().zip(&on_wake) {
            node.negative_potential.equation_id = if is_on_wake {
                next += 1;
                Some(next - 1)
            } else {
                None
            };
        }

        debug!("Numbered {} equations for {} nodes", next, self.nodes.len());
        next
    }

    pub fn num_equations(&self) -> usize {
        self.nodes
            .iter()
            .flat_map(|node| [node.positive_potential.equation_id, node.negative_potential.equation_id])
            .flatten()
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    /// Validates every element. Fails on the first invalid element.
    pub fn check(&self, conditions: &FlowConditions<T>) -> eyre::Result<()> {
        for element in &self.elements {
            element
                .check(&self.nodes, conditions)
                .wrap_err_with(|| format!("Check of element {} failed", element.id))?;
        }
        Ok(())
    }

    /// Sets both potentials of every node to the free-stream potential `v_inf . x`.
    pub fn initialize_free_stream_potential(&mut self, conditions: &FlowConditions<T>) {
        for node in &mut self.nodes {
            let potential = conditions.free_stream_velocity.dot(&node.position);
            node.positive_potential.value = potential;
            node.negative_potential.value = potential;
        }
    }

    /// Adds a solution increment of the global system to the nodal unknowns.
    pub fn apply_increment(&mut self, increment: &DVector<T>) -> eyre::Result<()> {
        for node in &mut self.nodes {
            for face in [PotentialFace::Positive, PotentialFace::Negative] {
                let dof = node.dof_mut(face);
                if let Some(id) = dof.equation_id {
                    let delta = increment
                        .get(id)
                        .ok_or_else(|| eyre!("Increment has {} entries, equation {} is out of range", increment.len(), id))?;
                    dof.value += *delta;
                }
            }
        }
        Ok(())
    }
}
