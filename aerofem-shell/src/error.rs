use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Fatal errors of membrane and shell elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// No constitutive law was assigned before initialization.
    MissingConstitutiveLaw { element: usize },
    /// The constitutive law works on a strain vector that cannot be coupled to the element.
    StrainSizeMismatch {
        element: usize,
        element_strain_size: usize,
        law_strain_size: usize,
    },
    /// The element was used before its initial metric was computed.
    NotInitialized { element: usize },
    /// The element references a node that is not present in the node store.
    MissingNode { element: usize, node: usize },
    /// Integration point data does not match the number of element nodes.
    IntegrationPointMismatch {
        element: usize,
        num_nodes: usize,
        num_shape_functions: usize,
    },
    /// The element has no integration points.
    NoIntegrationPoints { element: usize },
    /// The surface metric is singular at an integration point.
    DegenerateMetric { element: usize, point: usize },
    /// Prestress is only available for membranes.
    UnsupportedPrestress { element: usize },
    /// A nodal dof has no equation id assigned.
    UnnumberedDof { element: usize, node_id: usize },
}

impl Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            ShellError::MissingConstitutiveLaw { element } => {
                write!(f, "Shell element {} has no constitutive law.", element)
            }
            ShellError::StrainSizeMismatch {
                element,
                element_strain_size,
                law_strain_size,
            } => write!(
                f,
                "Constitutive law of shell element {} has strain size {}, \
                 which is incompatible with the element strain size {}.",
                element, law_strain_size, element_strain_size
            ),
            ShellError::NotInitialized { element } => {
                write!(f, "Shell element {} was used before initialization.", element)
            }
            ShellError::MissingNode { element, node } => {
                write!(f, "Shell element {} references missing node with index {}.", element, node)
            }
            ShellError::IntegrationPointMismatch {
                element,
                num_nodes,
                num_shape_functions,
            } => write!(
                f,
                "Shell element {} has {} nodes but its integration points carry {} shape functions.",
                element, num_nodes, num_shape_functions
            ),
            ShellError::NoIntegrationPoints { element } => {
                write!(f, "Shell element {} has no integration points.", element)
            }
            ShellError::DegenerateMetric { element, point } => write!(
                f,
                "Surface metric of shell element {} is singular at integration point {}.",
                element, point
            ),
            ShellError::UnsupportedPrestress { element } => write!(
                f,
                "Shell element {} has a prestress, which is only supported by membranes.",
                element
            ),
            ShellError::UnnumberedDof { element, node_id } => write!(
                f,
                "Shell element {} requires a dof on node {} that was never numbered.",
                element, node_id
            ),
        }
    }
}

impl Error for ShellError {}
