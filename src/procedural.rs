//! Procedural generation of structured potential flow models.
use crate::element::PotentialFlowElement;
use crate::model::PotentialFlowModel;
use crate::node::PotentialNode;
use crate::Real;
use nalgebra::{Vector2, Vector3};

/// Generates a rectangle of `cells_x * cells_y` square cells of size `cell_size`, each split
/// into two counter-clockwise triangles.
///
/// Nodes are numbered row by row starting at `lower_left`, node and element ids start at 1.
pub fn create_rectangular_triangle_model<T: Real>(
    cells_x: usize,
    cells_y: usize,
    cell_size: T,
    lower_left: &Vector2<T>,
    density: T,
) -> PotentialFlowModel<T> {
    let index = |i: usize, j: usize| j * (cells_x + 1) + i;
    let coordinate = |origin: T, i: usize| origin + cell_size * T::from_usize(i).unwrap();

    let mut nodes = Vec::with_capacity((cells_x + 1) * (cells_y + 1));
    for j in 0..=cells_y {
        for i in 0..=cells_x {
            let position = Vector3::new(coordinate(lower_left.x, i), coordinate(lower_left.y, j), T::zero());
            nodes.push(PotentialNode::new(index(i, j) + 1, position));
        }
    }

    let mut elements = Vec::with_capacity(2 * cells_x * cells_y);
    for j in 0..cells_y {
        for i in 0..cells_x {
            let (a, b, c, d) = (index(i, j), index(i + 1, j), index(i + 1, j + 1), index(i, j + 1));
            let id = elements.len() + 1;
            elements.push(PotentialFlowElement::new(id, vec![a, b, c], density));
            elements.push(PotentialFlowElement::new(id + 1, vec![a, c, d], density));
        }
    }

    PotentialFlowModel::new(nodes, elements)
}

/// Generates a box of `cells[0] * cells[1] * cells[2]` cubes of size `cell_size`, each split
/// into six positively oriented tetrahedra sharing the main diagonal of the cube.
pub fn create_box_tetrahedron_model<T: Real>(
    cells: [usize; 3],
    cell_size: T,
    corner: &Vector3<T>,
    density: T,
) -> PotentialFlowModel<T> {
    let [nx, ny, nz] = cells;
    let index = |i: usize, j: usize, k: usize| (k * (ny + 1) + j) * (nx + 1) + i;

    let mut nodes = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                let offset = Vector3::new(
                    T::from_usize(i).unwrap(),
                    T::from_usize(j).unwrap(),
                    T::from_usize(k).unwrap(),
                ) * cell_size;
                nodes.push(PotentialNode::new(index(i, j, k) + 1, corner + offset));
            }
        }
    }

    // Paths from the lower to the upper corner of the cube along the coordinate axes
    const PATHS: [([usize; 3], bool); 6] = [
        ([0, 1, 2], false),
        ([1, 2, 0], false),
        ([2, 0, 1], false),
        ([0, 2, 1], true),
        ([1, 0, 2], true),
        ([2, 1, 0], true),
    ];

    let mut elements = Vec::with_capacity(6 * nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                for (axes, odd) in PATHS {
                    let mut vertex = [i, j, k];
                    let mut tetrahedron = vec![index(i, j, k)];
                    for axis in axes {
                        vertex[axis] += 1;
                        tetrahedron.push(index(vertex[0], vertex[1], vertex[2]));
                    }
                    if odd {
                        tetrahedron.swap(2, 3);
                    }
                    elements.push(PotentialFlowElement::new(elements.len() + 1, tetrahedron, density));
                }
            }
        }
    }

    PotentialFlowModel::new(nodes, elements)
}
