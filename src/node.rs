//! Nodes carrying the velocity potential unknowns.
use crate::Real;
use nalgebra::{Scalar, Vector3};
use serde::{Deserialize, Serialize};

/// Side of the wake discontinuity a nodal unknown belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PotentialFace {
    Positive,
    Negative,
}

/// A nodal unknown together with its position in the global system.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodalDof<T> {
    pub value: T,
    pub equation_id: Option<usize>,
}

impl<T: Real> Default for NodalDof<T> {
    fn default() -> Self {
        Self {
            value: T::zero(),
            equation_id: None,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFlags {
    /// The node lies on the trailing edge of the lifting body.
    pub structure: bool,
    /// The node lies on the lower surface of the body.
    pub boundary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialNode<T: Scalar> {
    pub id: usize,
    pub position: Vector3<T>,
    pub positive_potential: NodalDof<T>,
    /// Only meaningful for nodes of wake elements.
    pub negative_potential: NodalDof<T>,
    pub flags: NodeFlags,
}

impl<T: Real> PotentialNode<T> {
    pub fn new(id: usize, position: Vector3<T>) -> Self {
        Self {
            id,
            position,
            positive_potential: NodalDof::default(),
            negative_potential: NodalDof::default(),
            flags: NodeFlags::default(),
        }
    }

    pub fn with_flags(self, flags: NodeFlags) -> Self {
        Self { flags, ..self }
    }

    pub fn dof(&self, face: PotentialFace) -> &NodalDof<T> {
        match face {
            PotentialFace::Positive => &self.positive_potential,
            PotentialFace::Negative => &self.negative_potential,
        }
    }

    pub fn dof_mut(&mut self, face: PotentialFace) -> &mut NodalDof<T> {
        match face {
            PotentialFace::Positive => &mut self.positive_potential,
            PotentialFace::Negative => &mut self.negative_potential,
        }
    }

    pub fn potential(&self, face: PotentialFace) -> T {
        self.dof(face).value
    }
}

/// Identifies one nodal unknown: the node index in the node store and the face.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DofHandle {
    pub node: usize,
    pub face: PotentialFace,
}
