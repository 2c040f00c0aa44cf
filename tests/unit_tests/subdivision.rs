use aerofem::geometry::SimplexGeometry;
use aerofem::nalgebra::DMatrix;
use aerofem::subdivision::{ElementSubdivision, Partition, PartitionSign, SimplexSubdivision};
use matrixcompare::assert_scalar_eq;
use proptest::prelude::*;

fn reference_triangle() -> DMatrix<f64> {
    DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0])
}

fn reference_tetrahedron() -> DMatrix<f64> {
    #[rustfmt::skip]
    let coordinates = DMatrix::from_row_slice(4, 3, &[
        0.0, 0.0, 0.0,
        1.0, 0.0, 0.0,
        0.0, 1.0, 0.0,
        0.0, 0.0, 1.0
    ]);
    coordinates
}

fn volume_on_side(partitions: &[Partition<f64>], sign: PartitionSign) -> f64 {
    partitions
        .iter()
        .filter(|partition| partition.sign == sign)
        .map(|partition| partition.volume)
        .sum()
}

#[test]
fn uncut_element_is_a_single_partition() {
    let partitions = SimplexSubdivision
        .subdivide(SimplexGeometry::Triangle3, &reference_triangle(), &[1.0, 2.0, 0.5])
        .unwrap();
    assert_eq!(partitions.len(), 1);
    assert_eq!(partitions[0].sign, PartitionSign::Positive);
    assert_scalar_eq!(partitions[0].volume, 0.5, comp = abs, tol = 1e-14);
}

#[test]
fn triangle_cut_by_horizontal_line() {
    // Level set y - 0.5
    let partitions = SimplexSubdivision
        .subdivide(SimplexGeometry::Triangle3, &reference_triangle(), &[-0.5, -0.5, 0.5])
        .unwrap();
    assert_eq!(partitions.len(), 3);
    assert_scalar_eq!(volume_on_side(&partitions, PartitionSign::Positive), 0.125, comp = abs, tol = 1e-14);
    assert_scalar_eq!(volume_on_side(&partitions, PartitionSign::Negative), 0.375, comp = abs, tol = 1e-14);
}

#[test]
fn zero_distance_node_belongs_to_negative_side() {
    let partitions = SimplexSubdivision
        .subdivide(SimplexGeometry::Triangle3, &reference_triangle(), &[0.0, 1.0, 1.0])
        .unwrap();
    assert!(partitions.iter().any(|partition| partition.sign == PartitionSign::Negative));
    assert_scalar_eq!(volume_on_side(&partitions, PartitionSign::Negative), 0.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(volume_on_side(&partitions, PartitionSign::Positive), 0.5, comp = abs, tol = 1e-14);
}

#[test]
fn tetrahedron_cut_with_one_isolated_node() {
    // Level set z - 0.5
    let partitions = SimplexSubdivision
        .subdivide(SimplexGeometry::Tetrahedron4, &reference_tetrahedron(), &[-0.5, -0.5, -0.5, 0.5])
        .unwrap();
    assert_eq!(partitions.len(), 4);
    let positive = volume_on_side(&partitions, PartitionSign::Positive);
    let negative = volume_on_side(&partitions, PartitionSign::Negative);
    assert_scalar_eq!(positive, 1.0 / 48.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(negative, 1.0 / 6.0 - 1.0 / 48.0, comp = abs, tol = 1e-14);
}

#[test]
fn tetrahedron_cut_with_two_nodes_on_each_side() {
    // Level set x + y - 0.5
    let partitions = SimplexSubdivision
        .subdivide(SimplexGeometry::Tetrahedron4, &reference_tetrahedron(), &[-0.5, 0.5, 0.5, -0.5])
        .unwrap();
    assert_eq!(partitions.len(), 6);
    assert_scalar_eq!(volume_on_side(&partitions, PartitionSign::Positive), 1.0 / 12.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(volume_on_side(&partitions, PartitionSign::Negative), 1.0 / 12.0, comp = abs, tol = 1e-14);
}

#[test]
fn mismatching_distances_are_rejected() {
    let result = SimplexSubdivision.subdivide(SimplexGeometry::Triangle3, &reference_triangle(), &[1.0, -1.0]);
    assert!(result.is_err());
}

proptest! {
    #[test]
    fn partition_volumes_sum_to_element_volume(
        distances in proptest::collection::vec(-1.0..1.0f64, 4),
        scale in 0.5..3.0f64,
    ) {
        let coordinates = reference_tetrahedron() * scale;
        let partitions = SimplexSubdivision
            .subdivide(SimplexGeometry::Tetrahedron4, &coordinates, &distances)
            .unwrap();
        let total: f64 = partitions.iter().map(|partition| partition.volume).sum();
        let expected = scale * scale * scale / 6.0;
        prop_assert!((total - expected).abs() <= 1e-12 * expected);

        let triangle = reference_triangle() * scale;
        let partitions = SimplexSubdivision
            .subdivide(SimplexGeometry::Triangle3, &triangle, &distances[..3])
            .unwrap();
        let total: f64 = partitions.iter().map(|partition| partition.volume).sum();
        let expected = scale * scale / 2.0;
        prop_assert!((total - expected).abs() <= 1e-12 * expected);
    }
}
