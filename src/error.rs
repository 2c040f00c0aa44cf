//! Errors raised by element level computations.
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Fatal element errors.
///
/// Configuration errors are raised by the one-time check pass, input errors at the first use
/// of the offending data. Numerical anomalies in the density closure are regularized and
/// never surface here.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementError {
    /// Element ids start at 1.
    InvalidId { element: usize },
    /// The element has zero or negative area/volume.
    NonPositiveVolume { element: usize },
    /// The element references a node that is not present in the node store.
    MissingNode { element: usize, node: usize },
    /// A nodal unknown has no equation id assigned.
    UnnumberedDof { element: usize, node_id: usize },
    /// The node count does not describe a supported simplex.
    UnsupportedGeometry { element: usize, num_nodes: usize },
    /// The wake distance field does not have one value per node.
    WakeDistanceMismatch { element: usize, expected: usize, actual: usize },
    /// One of the free-stream scalars was never populated.
    UnsetFreeStream { quantity: &'static str },
    /// The free-stream state is populated but not physical.
    InvalidFlowConditions { reason: String },
    /// The sub-division produced no partition on a side of the wake.
    Subdivision { element: usize, reason: String },
}

impl Display for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            ElementError::InvalidId { element } => {
                write!(f, "Element found with id {}. Element ids must be at least 1.", element)
            }
            ElementError::NonPositiveVolume { element } => {
                write!(f, "Element {} has zero or negative area/volume.", element)
            }
            ElementError::MissingNode { element, node } => {
                write!(f, "Element {} references missing node with index {}.", element, node)
            }
            ElementError::UnnumberedDof { element, node_id } => write!(
                f,
                "Element {} requires a velocity potential unknown on node {} that was never numbered.",
                element, node_id
            ),
            ElementError::UnsupportedGeometry { element, num_nodes } => write!(
                f,
                "Element {} has {} nodes. Only 3-node triangles and 4-node tetrahedra are supported.",
                element, num_nodes
            ),
            ElementError::WakeDistanceMismatch {
                element,
                expected,
                actual,
            } => write!(
                f,
                "Wake element {} has {} nodal distances, expected {}.",
                element, actual, expected
            ),
            ElementError::UnsetFreeStream { quantity } => {
                write!(f, "Free stream {} is zero. Was it set in the flow conditions?", quantity)
            }
            ElementError::InvalidFlowConditions { reason } => {
                write!(f, "Invalid flow conditions: {}", reason)
            }
            ElementError::Subdivision { element, reason } => {
                write!(f, "Sub-division of wake element {} failed: {}", element, reason)
            }
        }
    }
}

impl Error for ElementError {}
