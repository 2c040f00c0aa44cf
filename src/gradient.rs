//! Recovery of nodal potential gradients from the element gradients.
use crate::element::PotentialFlowElement;
use crate::error::ElementError;
use crate::model::PotentialFlowModel;
use crate::node::{PotentialFace, PotentialNode};
use crate::wake::ElementKind;
use crate::Real;
use eyre::WrapErr;
use log::warn;
use nalgebra::{DVector, Vector3};
use rayon::prelude::*;

/// Per-node accumulators of the weighted gradient and the weight.
struct NodalAccumulator<T: Real> {
    gradients: Vec<Vector3<T>>,
    weights: Vec<T>,
}

impl<T: Real> NodalAccumulator<T> {
    fn zeros(num_nodes: usize) -> Self {
        Self {
            gradients: vec![Vector3::zeros(); num_nodes],
            weights: vec![T::zero(); num_nodes],
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (gradient, other) in self.gradients.iter_mut().zip(other.gradients) {
            *gradient += other;
        }
        for (weight, other) in self.weights.iter_mut().zip(other.weights) {
            *weight += other;
        }
        self
    }
}

/// Face whose potential represents the flow field of `element` at its local node `i`.
///
/// Wake elements read the upper unknowns. Normal elements read the negative face at
/// trailing edge nodes, where it carries the potential of the lower surface.
fn gradient_face<T: Real>(element: &PotentialFlowElement<T>, node: &PotentialNode<T>, i: usize) -> PotentialFace {
    match element.kind() {
        ElementKind::Wake(wake) => {
            if wake.distances[i] > T::zero() {
                PotentialFace::Positive
            } else {
                PotentialFace::Negative
            }
        }
        ElementKind::Normal if node.flags.structure => PotentialFace::Negative,
        ElementKind::Normal => PotentialFace::Positive,
    }
}

/// Computes a continuous nodal gradient of the velocity potential.
///
/// Each node receives the average of the gradients of the surrounding elements, weighted by
/// the shape function value and measure of each element. Elements are processed in parallel
/// with thread-private accumulators that are reduced at the end. Gradients of
/// two-dimensional models have a zero third component.
pub fn compute_nodal_potential_gradient<T: Real>(model: &PotentialFlowModel<T>) -> eyre::Result<Vec<Vector3<T>>> {
    let num_nodes = model.nodes.len();
    let accumulator = model
        .elements
        .par_iter()
        .try_fold(
            || NodalAccumulator::zeros(num_nodes),
            |mut accumulator, element| -> Result<_, ElementError> {
                let data = element.geometry_data(&model.nodes)?;
                let phi = DVector::from_iterator(
                    element.num_nodes(),
                    element.nodes.iter().enumerate().map(|(i, &index)| {
                        let node = &model.nodes[index];
                        node.potential(gradient_face(element, node, i))
                    }),
                );
                let gradient = data.gradient(&phi);
                let mut padded = Vector3::zeros();
                padded.rows_mut(0, gradient.len()).copy_from(&gradient);

                for (i, &index) in element.nodes.iter().enumerate() {
                    let weight = data.shape_values[i] * data.volume;
                    accumulator.gradients[index] += padded * weight;
                    accumulator.weights[index] += weight;
                }
                Ok(accumulator)
            },
        )
        .try_reduce(|| NodalAccumulator::zeros(num_nodes), |a, b| Ok(a.merge(b)))
        .wrap_err("Nodal gradient recovery failed")?;

    let gradients = accumulator
        .gradients
        .into_iter()
        .zip(accumulator.weights)
        .zip(&model.nodes)
        .map(|((gradient, weight), node)| {
            if weight > T::zero() {
                gradient / weight
            } else {
                warn!("Node {} is not connected to any element, its gradient is zero", node.id);
                Vector3::zeros()
            }
        })
        .collect();
    Ok(gradients)
}
