//! Nodes of membrane and shell elements.
use crate::Real;
use aerofem::nalgebra::{Scalar, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Nodal degrees of freedom in local ordering.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShellDof {
    DisplacementX,
    DisplacementY,
    DisplacementZ,
    /// Component of the shear difference vector along $\vec g_1$.
    ShearDifference1,
    /// Component of the shear difference vector along $\vec g_2$.
    ShearDifference2,
}

impl ShellDof {
    pub const ALL: [ShellDof; 5] = [
        ShellDof::DisplacementX,
        ShellDof::DisplacementY,
        ShellDof::DisplacementZ,
        ShellDof::ShearDifference1,
        ShellDof::ShearDifference2,
    ];

    pub fn index(&self) -> usize {
        match self {
            ShellDof::DisplacementX => 0,
            ShellDof::DisplacementY => 1,
            ShellDof::DisplacementZ => 2,
            ShellDof::ShearDifference1 => 3,
            ShellDof::ShearDifference2 => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellNode<T: Scalar> {
    pub id: usize,
    pub reference_position: Vector3<T>,
    pub displacement: Vector3<T>,
    /// Hierarchic shear difference parameters, only used by Reissner-Mindlin shells.
    pub shear_difference: Vector2<T>,
    /// Equation ids indexed by [`ShellDof::index`].
    pub equation_ids: [Option<usize>; 5],
}

impl<T: Real> ShellNode<T> {
    pub fn new(id: usize, reference_position: Vector3<T>) -> Self {
        Self {
            id,
            reference_position,
            displacement: Vector3::zeros(),
            shear_difference: Vector2::zeros(),
            equation_ids: [None; 5],
        }
    }

    pub fn current_position(&self) -> Vector3<T> {
        self.reference_position + self.displacement
    }

    pub fn dof_value(&self, dof: ShellDof) -> T {
        match dof {
            ShellDof::DisplacementX => self.displacement.x,
            ShellDof::DisplacementY => self.displacement.y,
            ShellDof::DisplacementZ => self.displacement.z,
            ShellDof::ShearDifference1 => self.shear_difference.x,
            ShellDof::ShearDifference2 => self.shear_difference.y,
        }
    }

    pub fn dof_value_mut(&mut self, dof: ShellDof) -> &mut T {
        match dof {
            ShellDof::DisplacementX => &mut self.displacement.x,
            ShellDof::DisplacementY => &mut self.displacement.y,
            ShellDof::DisplacementZ => &mut self.displacement.z,
            ShellDof::ShearDifference1 => &mut self.shear_difference.x,
            ShellDof::ShearDifference2 => &mut self.shear_difference.y,
        }
    }
}

/// Identifies one nodal dof: the node index in the node store and the dof.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ShellDofHandle {
    pub node: usize,
    pub dof: ShellDof,
}
