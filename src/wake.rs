//! Wake element state and the sign rules mapping nodal distances to potential faces.
use crate::node::{NodeFlags, PotentialFace};
use crate::Real;
use nalgebra::{Scalar, Vector3};
use serde::{Deserialize, Serialize};

/// Persistent classification of a potential flow element, decided once before assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind<T: Scalar> {
    Normal,
    Wake(WakeElementData<T>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WakeElementData<T: Scalar> {
    /// Signed distance of every element node to the wake surface.
    pub distances: Vec<T>,
    /// Apply the one-sided trailing edge coupling instead of the two-sided one.
    pub trailing_edge: bool,
}

impl<T: Real> WakeElementData<T> {
    pub fn new(distances: Vec<T>, trailing_edge: bool) -> Self {
        Self {
            distances,
            trailing_edge,
        }
    }

    pub fn upper_face(&self, local_node: usize) -> PotentialFace {
        upper_face(self.distances[local_node])
    }

    pub fn lower_face(&self, local_node: usize) -> PotentialFace {
        lower_face(self.distances[local_node])
    }
}

/// Face providing the unknown in the first half of a wake element's local system.
pub fn upper_face<T: Real>(distance: T) -> PotentialFace {
    if distance > T::zero() {
        PotentialFace::Positive
    } else {
        PotentialFace::Negative
    }
}

/// Face providing the unknown in the second half of a wake element's local system.
///
/// Note that a node with zero distance maps to the negative face in both halves.
pub fn lower_face<T: Real>(distance: T) -> PotentialFace {
    if distance < T::zero() {
        PotentialFace::Positive
    } else {
        PotentialFace::Negative
    }
}

/// Whether a wake element receives the one-sided trailing edge coupling.
///
/// This is the case for elements flagged as boundary themselves, and for elements touching
/// the trailing edge that have more than one node on the lower surface.
pub fn is_trailing_edge_element(node_flags: impl IntoIterator<Item = NodeFlags>, element_boundary: bool) -> bool {
    let mut touches_trailing_edge = false;
    let mut boundary_nodes = 0;
    for flags in node_flags {
        touches_trailing_edge |= flags.structure;
        if flags.boundary {
            boundary_nodes += 1;
        }
    }
    (touches_trailing_edge && boundary_nodes > 1) || element_boundary
}

/// A straight wake sheet leaving the trailing edge in the direction of the free stream.
///
/// In two dimensions the sheet is a half line, in three dimensions a half plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WakeSurface<T: Scalar> {
    /// A point on the trailing edge.
    pub origin: Vector3<T>,
    /// Unit vector pointing downstream.
    pub direction: Vector3<T>,
    /// Unit normal of the sheet, pointing towards the positive side.
    pub normal: Vector3<T>,
}

impl<T: Real> WakeSurface<T> {
    /// Builds the sheet from arbitrary (non-unit) direction and normal vectors.
    pub fn new(origin: Vector3<T>, direction: Vector3<T>, normal: Vector3<T>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            normal: normal.normalize(),
        }
    }

    /// Wake in the xy-plane leaving `trailing_edge` along the free stream.
    ///
    /// The positive side is to the left of the free stream direction, that is the upper
    /// side for a flow in positive x-direction.
    pub fn from_free_stream_2d(trailing_edge: Vector3<T>, free_stream_velocity: &Vector3<T>) -> Self {
        let normal = Vector3::new(-free_stream_velocity.y, free_stream_velocity.x, T::zero());
        Self::new(trailing_edge, *free_stream_velocity, normal)
    }

    pub fn signed_distance(&self, point: &Vector3<T>) -> T {
        (point - self.origin).dot(&self.normal)
    }

    /// Distance of the projection of `point` downstream of the trailing edge.
    pub fn downstream_distance(&self, point: &Vector3<T>) -> T {
        (point - self.origin).dot(&self.direction)
    }
}
