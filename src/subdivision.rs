//! Partitioning of wake elements into sub-simplices on either side of the wake.
use crate::geometry::SimplexGeometry;
use crate::Real;
use eyre::eyre;
use nalgebra::{DMatrix, DVector, Scalar};
use numeric_literals::replace_float_literals;

/// Side of the wake a partition (or a node) belongs to.
///
/// A node with exactly zero distance is on the negative side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PartitionSign {
    Positive,
    Negative,
}

impl PartitionSign {
    pub fn of<T: Real>(distance: T) -> Self {
        if distance > T::zero() {
            PartitionSign::Positive
        } else {
            PartitionSign::Negative
        }
    }
}

/// A sign-consistent part of a cut element.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition<T: Scalar> {
    pub volume: T,
    pub sign: PartitionSign,
}

/// Splits an element along the zero level set of a nodal distance field.
pub trait ElementSubdivision<T: Real>: Sync {
    fn subdivide(
        &self,
        geometry: SimplexGeometry,
        coordinates: &DMatrix<T>,
        distances: &[T],
    ) -> eyre::Result<Vec<Partition<T>>>;
}

/// Exact sub-division of linear simplices into sub-simplices.
///
/// Triangles are cut into a triangle around the isolated node and a quadrilateral that is
/// split into two triangles. Tetrahedra are cut into a tetrahedron and a prism (one node
/// isolated) or into two prisms (two nodes on each side); every prism is split into three
/// tetrahedra. One partition is returned per sub-simplex.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SimplexSubdivision;

impl<T: Real> ElementSubdivision<T> for SimplexSubdivision {
    fn subdivide(
        &self,
        geometry: SimplexGeometry,
        coordinates: &DMatrix<T>,
        distances: &[T],
    ) -> eyre::Result<Vec<Partition<T>>> {
        let n = geometry.num_nodes();
        if distances.len() != n || coordinates.nrows() != n || coordinates.ncols() != geometry.dim() {
            return Err(eyre!(
                "expected {} nodal distances and a {}x{} coordinate matrix",
                n,
                n,
                geometry.dim()
            ));
        }

        let signs: Vec<_> = distances.iter().map(|&d| PartitionSign::of(d)).collect();
        let vertex = |i: usize| -> DVector<T> { coordinates.row(i).transpose() };
        let cut = |i: usize, j: usize| cut_point(&vertex(i), &vertex(j), distances[i], distances[j]);

        let positive: Vec<usize> = (0..n)
            .filter(|&i| signs[i] == PartitionSign::Positive)
            .collect();
        let negative: Vec<usize> = (0..n)
            .filter(|&i| signs[i] == PartitionSign::Negative)
            .collect();

        if positive.is_empty() || negative.is_empty() {
            let points: Vec<_> = (0..n).map(vertex).collect();
            return Ok(vec![Partition {
                volume: simplex_measure(&points),
                sign: signs[0],
            }]);
        }

        let mut partitions = Vec::new();
        let mut push = |points: Vec<DVector<T>>, sign| {
            partitions.push(Partition {
                volume: simplex_measure(&points),
                sign,
            })
        };

        match geometry {
            SimplexGeometry::Triangle3 => {
                let (isolated, others) = if positive.len() == 1 {
                    (positive[0], [negative[0], negative[1]])
                } else {
                    (negative[0], [positive[0], positive[1]])
                };
                let [a, b] = others;
                let p_a = cut(isolated, a);
                let p_b = cut(isolated, b);
                push(vec![vertex(isolated), p_a.clone(), p_b.clone()], signs[isolated]);
                push(vec![p_a.clone(), vertex(a), vertex(b)], signs[a]);
                push(vec![p_a, vertex(b), p_b], signs[a]);
            }
            SimplexGeometry::Tetrahedron4 => {
                if positive.len() == 2 {
                    let [i, j] = [positive[0], positive[1]];
                    let [k, l] = [negative[0], negative[1]];
                    let (p_ik, p_il, p_jk, p_jl) = (cut(i, k), cut(i, l), cut(j, k), cut(j, l));
                    let bottom = [vertex(i), p_ik.clone(), p_il.clone()];
                    let top = [vertex(j), p_jk.clone(), p_jl.clone()];
                    for tet in prism_tetrahedra(&bottom, &top) {
                        push(tet.to_vec(), signs[i]);
                    }
                    let bottom = [vertex(k), p_ik, p_jk];
                    let top = [vertex(l), p_il, p_jl];
                    for tet in prism_tetrahedra(&bottom, &top) {
                        push(tet.to_vec(), signs[k]);
                    }
                } else {
                    let (isolated, others) = if positive.len() == 1 {
                        (positive[0], [negative[0], negative[1], negative[2]])
                    } else {
                        (negative[0], [positive[0], positive[1], positive[2]])
                    };
                    let cuts = others.map(|other| cut(isolated, other));
                    push(
                        vec![vertex(isolated), cuts[0].clone(), cuts[1].clone(), cuts[2].clone()],
                        signs[isolated],
                    );
                    let far = others.map(vertex);
                    for tet in prism_tetrahedra(&cuts, &far) {
                        push(tet.to_vec(), signs[others[0]]);
                    }
                }
            }
        }

        Ok(partitions)
    }
}

/// Point on the edge `a`-`b` where the linearly interpolated distance vanishes.
fn cut_point<T: Real>(a: &DVector<T>, b: &DVector<T>, distance_a: T, distance_b: T) -> DVector<T> {
    let t = distance_a / (distance_a - distance_b);
    a + (b - a) * t
}

/// Splits the prism spanned by the triangles `bottom` and `top` into three tetrahedra.
///
/// `bottom[i]` and `top[i]` must be connected by an edge of the prism.
fn prism_tetrahedra<T: Real>(bottom: &[DVector<T>; 3], top: &[DVector<T>; 3]) -> [[DVector<T>; 4]; 3] {
    let [a0, a1, a2] = bottom.clone();
    let [b0, b1, b2] = top.clone();
    [
        [a0, a1.clone(), a2.clone(), b0.clone()],
        [a1, a2.clone(), b0.clone(), b1.clone()],
        [a2, b0, b1, b2],
    ]
}

/// Unsigned measure of the simplex with the given vertices.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn simplex_measure<T: Real>(points: &[DVector<T>]) -> T {
    let dim = points.len() - 1;
    let edges = DMatrix::from_fn(dim, dim, |i, j| points[j + 1][i] - points[0][i]);
    let factorial = (1..=dim).fold(1.0, |acc, k| acc * T::from_usize(k).unwrap());
    edges.determinant().abs() / factorial
}
