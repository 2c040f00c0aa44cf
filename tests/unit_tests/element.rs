use super::{
    flow_conditions, reference_triangle_nodes, single_element_model, skewed_triangle_nodes, tetrahedron_nodes,
    FREE_STREAM_DENSITY,
};
use aerofem::density::{compute_density, compute_density_from_speed_squared};
use aerofem::element::PotentialFlowElement;
use aerofem::error::ElementError;
use aerofem::geometry::{GeometryData, SimplexGeometry};
use aerofem::model::PotentialFlowModel;
use aerofem::nalgebra::{DMatrix, DVector, Vector3};
use aerofem::node::{PotentialFace, PotentialNode};
use aerofem::settings::FlowConditions;
use aerofem::subdivision::{ElementSubdivision, Partition, PartitionSign, SimplexSubdivision};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};

/// Returns one partition per side, each covering the whole element.
struct FullVolumePerSide;

impl ElementSubdivision<f64> for FullVolumePerSide {
    fn subdivide(
        &self,
        geometry: SimplexGeometry,
        coordinates: &DMatrix<f64>,
        _distances: &[f64],
    ) -> eyre::Result<Vec<Partition<f64>>> {
        let volume = geometry.signed_volume(coordinates);
        Ok(vec![
            Partition {
                volume,
                sign: PartitionSign::Positive,
            },
            Partition {
                volume,
                sign: PartitionSign::Negative,
            },
        ])
    }
}

fn laplacian(nodes: &[PotentialNode<f64>], density: f64) -> DMatrix<f64> {
    let geometry = SimplexGeometry::from_num_nodes(nodes.len()).unwrap();
    let positions: Vec<_> = nodes.iter().map(|node| node.position).collect();
    let data = GeometryData::compute(geometry, &geometry.coordinate_matrix(&positions)).unwrap();
    &data.shape_gradients * data.shape_gradients.transpose() * (data.volume * density)
}

fn set_linear_potential(nodes: &mut [PotentialNode<f64>], gradient: Vector3<f64>, jump: f64) {
    for node in nodes {
        node.positive_potential.value = gradient.dot(&node.position);
        node.negative_potential.value = gradient.dot(&node.position) + jump;
    }
}

/// Sets the potentials seen above the wake to `upper . x` and below to `lower . x + 0.4`.
fn set_split_potentials(model: &mut PotentialFlowModel<f64>, upper: Vector3<f64>, lower: Vector3<f64>) {
    let element = model.elements[0].clone();
    let n = element.num_nodes();
    for (k, handle) in element.dof_list().into_iter().enumerate() {
        let node = &mut model.nodes[handle.node];
        let value = if k < n {
            upper.dot(&node.position)
        } else {
            lower.dot(&node.position) + 0.4
        };
        node.dof_mut(handle.face).value = value;
    }
}

fn split_potentials(model: &PotentialFlowModel<f64>) -> DVector<f64> {
    let handles = model.elements[0].dof_list();
    DVector::from_iterator(
        handles.len(),
        handles
            .iter()
            .map(|handle| model.nodes[handle.node].potential(handle.face)),
    )
}

/// Places per-side operators into the wake layout, row by row.
fn place_wake_blocks(
    positive: &DMatrix<f64>,
    negative: &DMatrix<f64>,
    distances: &[f64],
    trailing_edge: bool,
) -> DMatrix<f64> {
    let n = positive.nrows();
    let mut matrix = DMatrix::zeros(2 * n, 2 * n);
    for i in 0..n {
        for j in 0..n {
            matrix[(i, j)] = positive[(i, j)];
            if distances[i] < 0.0 {
                matrix[(i, j + n)] = -positive[(i, j)];
            }
            matrix[(i + n, j + n)] = negative[(i, j)];
            if distances[i] > 0.0 && !trailing_edge {
                matrix[(i + n, j)] = -negative[(i, j)];
            }
        }
    }
    matrix
}

/// Compressible wake tangent and residual rebuilt from the exact partitions of the element.
fn compressible_wake_reference(
    model: &PotentialFlowModel<f64>,
    conditions: &FlowConditions<f64>,
) -> (DMatrix<f64>, DVector<f64>) {
    let element = &model.elements[0];
    let wake = element.wake_data().unwrap();
    let n = element.num_nodes();
    let geometry = element.geometry().unwrap();
    let positions: Vec<_> = model.nodes.iter().map(|node| node.position).collect();
    let coordinates = geometry.coordinate_matrix(&positions);
    let data = GeometryData::compute(geometry, &coordinates).unwrap();
    let partitions = SimplexSubdivision
        .subdivide(geometry, &coordinates, &wake.distances)
        .unwrap();

    let split_phi = split_potentials(model);
    let side = |sign: PartitionSign, phi: DVector<f64>| {
        let volume: f64 = partitions
            .iter()
            .filter(|partition| partition.sign == sign)
            .map(|partition| partition.volume)
            .sum();
        let velocity = data.gradient(&phi);
        let response = compute_density(conditions, FREE_STREAM_DENSITY, &velocity).unwrap();
        let dnv = &data.shape_gradients * &velocity;
        let laplacian = &data.shape_gradients * data.shape_gradients.transpose() * (volume * response.density);
        let lhs = &laplacian + &dnv * dnv.transpose() * (volume * response.derivative);
        (lhs, laplacian)
    };
    let (lhs_positive, laplacian_positive) = side(PartitionSign::Positive, split_phi.rows(0, n).into_owned());
    let (lhs_negative, laplacian_negative) = side(PartitionSign::Negative, split_phi.rows(n, n).into_owned());

    let lhs = place_wake_blocks(&lhs_positive, &lhs_negative, &wake.distances, wake.trailing_edge);
    let laplacian = place_wake_blocks(
        &laplacian_positive,
        &laplacian_negative,
        &wake.distances,
        wake.trailing_edge,
    );
    let rhs = -(&laplacian * &split_phi);
    (lhs, rhs)
}

#[test]
fn dof_counts_match_local_system_size() {
    for nodes in [reference_triangle_nodes(), tetrahedron_nodes()] {
        let n = nodes.len();
        let model = single_element_model(nodes.clone(), None, false);
        let element = &model.elements[0];
        assert_eq!(element.dof_list().len(), n);
        assert_eq!(element.equation_ids(&model.nodes).unwrap().len(), n);
        let system = element.calculate_local_system(&model.nodes, &flow_conditions()).unwrap();
        assert_eq!(system.lhs.shape(), (n, n));
        assert_eq!(system.size(), n);

        let mut distances = vec![1.0; n];
        distances[1] = -1.0;
        let model = single_element_model(nodes, Some(distances), false);
        let element = &model.elements[0];
        assert_eq!(element.dof_list().len(), 2 * n);
        assert_eq!(element.equation_ids(&model.nodes).unwrap().len(), 2 * n);
        let system = element.calculate_local_system(&model.nodes, &flow_conditions()).unwrap();
        assert_eq!(system.lhs.shape(), (2 * n, 2 * n));
        assert_eq!(system.size(), 2 * n);
    }
}

#[test]
fn wake_dof_list_follows_distance_signs() {
    let model = single_element_model(reference_triangle_nodes(), Some(vec![1.0, -1.0, 0.0]), false);
    let element = &model.elements[0];
    let faces: Vec<_> = element.dof_list().iter().map(|handle| handle.face).collect();
    use PotentialFace::{Negative, Positive};
    assert_eq!(faces, vec![Positive, Negative, Negative, Negative, Positive, Negative]);

    let ids = element.equation_ids(&model.nodes).unwrap();
    let expected: Vec<_> = element
        .dof_list()
        .iter()
        .map(|handle| model.nodes[handle.node].dof(handle.face).equation_id.unwrap())
        .collect();
    assert_eq!(ids, expected);
    // Positive faces are numbered first, negative faces afterwards
    assert_eq!(ids, vec![0, 4, 5, 3, 1, 5]);
}

#[test]
fn incompressible_normal_element_is_pure_laplacian() {
    let model = single_element_model(reference_triangle_nodes(), None, false);
    let system = model.elements[0]
        .calculate_local_system(&model.nodes, &flow_conditions())
        .unwrap();

    let expected = laplacian(&model.nodes, FREE_STREAM_DENSITY);
    assert_matrix_eq!(system.lhs, expected, comp = abs, tol = 1e-14);
    assert_matrix_eq!(system.rhs, DVector::zeros(3), comp = abs, tol = 1e-14);
    // Scenario values: vol = 0.5, DN_DX = [[-1, -1], [1, 0], [0, 1]]
    assert_scalar_eq!(system.lhs[(0, 0)], 0.5 * 1.225 * 2.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(system.lhs[(1, 2)], 0.0, comp = abs, tol = 1e-14);
}

#[test]
fn normal_element_residual_is_minus_stiffness_times_potential() {
    let mut model = single_element_model(skewed_triangle_nodes(), None, false);
    set_linear_potential(&mut model.nodes, Vector3::new(3.0, -1.0, 0.0), 0.0);
    let system = model.elements[0]
        .calculate_local_system(&model.nodes, &flow_conditions())
        .unwrap();

    let phi = DVector::from_iterator(3, model.nodes.iter().map(|node| node.positive_potential.value));
    assert_matrix_eq!(system.rhs, -(&system.lhs * phi), comp = abs, tol = 1e-12);
    assert_scalar_eq!(system.rhs.sum(), 0.0, comp = abs, tol = 1e-12);
}

#[test]
fn compressible_normal_element_at_rest_uses_closure_density() {
    let conditions = FlowConditions {
        compressible: true,
        ..flow_conditions()
    };
    let model = single_element_model(skewed_triangle_nodes(), None, false);
    let system = model.elements[0]
        .calculate_local_system(&model.nodes, &conditions)
        .unwrap();

    // Zero velocity: the convective term vanishes
    let density = compute_density_from_speed_squared(&conditions, FREE_STREAM_DENSITY, 0.0)
        .unwrap()
        .density;
    assert_matrix_eq!(system.lhs, laplacian(&model.nodes, density), comp = abs, tol = 1e-12);
    assert_matrix_eq!(system.rhs, DVector::zeros(3), comp = abs, tol = 1e-14);
}

#[test]
fn compressible_tangent_adds_convective_term_only() {
    let conditions = FlowConditions {
        compressible: true,
        ..flow_conditions()
    };
    let mut model = single_element_model(skewed_triangle_nodes(), None, false);
    let velocity = Vector3::new(8.0, 3.0, 0.0);
    set_linear_potential(&mut model.nodes, velocity, 0.0);
    let system = model.elements[0]
        .calculate_local_system(&model.nodes, &conditions)
        .unwrap();

    let response =
        compute_density_from_speed_squared(&conditions, FREE_STREAM_DENSITY, velocity.norm_squared()).unwrap();
    let geometry = SimplexGeometry::Triangle3;
    let positions: Vec<_> = model.nodes.iter().map(|node| node.position).collect();
    let data = GeometryData::compute(geometry, &geometry.coordinate_matrix(&positions)).unwrap();
    let dnv = &data.shape_gradients * DVector::from_column_slice(&[8.0, 3.0]);
    let laplacian = laplacian(&model.nodes, response.density);
    let expected_lhs = &laplacian + &dnv * dnv.transpose() * (data.volume * response.derivative);

    let phi = DVector::from_iterator(3, model.nodes.iter().map(|node| node.positive_potential.value));
    assert_matrix_eq!(system.lhs, expected_lhs, comp = abs, tol = 1e-10);
    assert_matrix_eq!(system.rhs, -(&laplacian * phi), comp = abs, tol = 1e-10);
}

#[test]
fn wake_element_with_full_volume_sides_has_laplacian_blocks() {
    let model = single_element_model(reference_triangle_nodes(), Some(vec![1.0, -1.0, 1.0]), false);
    let system = model.elements[0]
        .calculate_local_system_with(&model.nodes, &flow_conditions(), &FullVolumePerSide)
        .unwrap();
    let k = laplacian(&model.nodes, FREE_STREAM_DENSITY);

    assert_matrix_eq!(system.lhs.view((0, 0), (3, 3)), k, comp = abs, tol = 1e-14);
    assert_matrix_eq!(system.lhs.view((3, 3), (3, 3)), k, comp = abs, tol = 1e-14);

    for j in 0..3 {
        // Node 1 lies below the wake: its upper row couples to the lower unknowns
        assert_eq!(system.lhs[(1, j + 3)], -k[(1, j)]);
        assert_eq!(system.lhs[(0, j + 3)], 0.0);
        assert_eq!(system.lhs[(2, j + 3)], 0.0);
        // Nodes 0 and 2 lie above the wake: their lower rows couple to the upper unknowns
        assert_eq!(system.lhs[(3, j)], -k[(0, j)]);
        assert_eq!(system.lhs[(5, j)], -k[(2, j)]);
        assert_eq!(system.lhs[(4, j)], 0.0);
    }
    assert_matrix_eq!(system.rhs, DVector::zeros(6), comp = abs, tol = 1e-14);
}

#[test]
fn wake_coupling_rows_negate_diagonal_blocks() {
    let distances = vec![0.3, -0.7, 0.4];
    let mut model = single_element_model(skewed_triangle_nodes(), Some(distances.clone()), false);
    set_linear_potential(&mut model.nodes, Vector3::new(1.0, 2.0, 0.0), 0.5);
    let system = model.elements[0]
        .calculate_local_system(&model.nodes, &flow_conditions())
        .unwrap();
    let n = 3;

    for i in 0..n {
        for j in 0..n {
            if distances[i] < 0.0 {
                assert_eq!(system.lhs[(i, j + n)], -system.lhs[(i, j)]);
            }
            if distances[i] > 0.0 {
                assert_eq!(system.lhs[(i + n, j)], -system.lhs[(i + n, j + n)]);
            }
        }
    }
}

#[test]
fn trailing_edge_element_skips_upper_node_coupling() {
    let distances = vec![0.3, -0.7, 0.4];
    let mut model = single_element_model(skewed_triangle_nodes(), Some(distances.clone()), true);
    set_linear_potential(&mut model.nodes, Vector3::new(1.0, 2.0, 0.0), 0.5);
    let element = &model.elements[0];
    assert!(element.wake_data().unwrap().trailing_edge);
    let system = element.calculate_local_system(&model.nodes, &flow_conditions()).unwrap();
    let n = 3;

    for i in 0..n {
        for j in 0..n {
            if distances[i] > 0.0 {
                assert_eq!(system.lhs[(i + n, j)], 0.0);
                assert_ne!(system.lhs[(i + n, j + n)], 0.0);
            } else {
                assert_eq!(system.lhs[(i, j + n)], -system.lhs[(i, j)]);
            }
        }
    }
}

#[test]
fn wake_residual_uses_split_potentials() {
    let distances = vec![0.3, -0.7, 0.4];
    let mut model = single_element_model(skewed_triangle_nodes(), Some(distances), false);
    set_linear_potential(&mut model.nodes, Vector3::new(1.0, 2.0, 0.0), 0.5);
    let element = &model.elements[0];
    let system = element.calculate_local_system(&model.nodes, &flow_conditions()).unwrap();

    let split_phi = DVector::from_iterator(
        6,
        element
            .dof_list()
            .iter()
            .map(|handle| model.nodes[handle.node].potential(handle.face)),
    );
    assert_matrix_eq!(system.rhs, -(&system.lhs * split_phi), comp = abs, tol = 1e-12);
    let rhs = element
        .calculate_right_hand_side(&model.nodes, &flow_conditions())
        .unwrap();
    assert_eq!(rhs, system.rhs);
}

#[test]
fn wake_sides_sum_to_element_laplacian() {
    let distances = vec![0.3, -0.7, 0.4];
    let model = single_element_model(skewed_triangle_nodes(), Some(distances), false);
    let system = model.elements[0]
        .calculate_local_system(&model.nodes, &flow_conditions())
        .unwrap();

    // Rows of node 0 are not overwritten in the upper block, rows of node 1 not in the lower
    let k = laplacian(&model.nodes, FREE_STREAM_DENSITY);
    let upper = system.lhs.view((0, 0), (3, 3));
    let lower = system.lhs.view((3, 3), (3, 3));
    for j in 0..3 {
        assert_scalar_eq!(upper[(0, j)] + lower[(0, j)], k[(0, j)], comp = abs, tol = 1e-12);
    }
}

#[test]
fn check_reports_configuration_errors() {
    let conditions = flow_conditions();
    let model = single_element_model(reference_triangle_nodes(), None, false);
    assert_eq!(model.elements[0].check(&model.nodes, &conditions), Ok(()));

    let mut invalid_id = model.elements[0].clone();
    invalid_id.id = 0;
    assert_eq!(
        invalid_id.check(&model.nodes, &conditions),
        Err(ElementError::InvalidId { element: 0 })
    );

    let inverted = PotentialFlowElement::new(7, vec![0, 2, 1], FREE_STREAM_DENSITY);
    assert_eq!(
        inverted.check(&model.nodes, &conditions),
        Err(ElementError::NonPositiveVolume { element: 7 })
    );

    let missing = PotentialFlowElement::new(8, vec![0, 1, 5], FREE_STREAM_DENSITY);
    assert_eq!(
        missing.check(&model.nodes, &conditions),
        Err(ElementError::MissingNode { element: 8, node: 5 })
    );

    let unnumbered_nodes = reference_triangle_nodes();
    assert_eq!(
        model.elements[0].check(&unnumbered_nodes, &conditions),
        Err(ElementError::UnnumberedDof { element: 1, node_id: 1 })
    );

    let five_nodes = PotentialFlowElement::new(9, vec![0, 1, 2, 0, 1], FREE_STREAM_DENSITY);
    assert_eq!(
        five_nodes.check(&model.nodes, &conditions),
        Err(ElementError::UnsupportedGeometry { element: 9, num_nodes: 5 })
    );
}

#[test]
fn wake_distances_must_match_node_count() {
    let mut element = PotentialFlowElement::new(3, vec![0, 1, 2], FREE_STREAM_DENSITY);
    assert_eq!(
        element.make_wake(vec![1.0, -1.0], false),
        Err(ElementError::WakeDistanceMismatch {
            element: 3,
            expected: 3,
            actual: 2
        })
    );
    assert!(!element.is_wake());
}

#[test]
fn velocity_and_pressure_coefficient_in_free_stream() {
    let conditions = flow_conditions();
    let mut model = single_element_model(skewed_triangle_nodes(), None, false);
    model.initialize_free_stream_potential(&conditions);
    let element = &model.elements[0];

    let velocity = element.velocity(&model.nodes).unwrap();
    assert_matrix_eq!(velocity, DVector::from_column_slice(&[100.0, 0.0]), comp = abs, tol = 1e-10);
    let cp = element.pressure_coefficient(&model.nodes, &conditions).unwrap();
    assert_scalar_eq!(cp, 0.0, comp = abs, tol = 1e-10);
    let density = element.local_density(&model.nodes, &conditions).unwrap();
    assert!(density > 0.0);
}

#[test]
fn wake_element_reports_upper_and_lower_velocities() {
    let mut model = single_element_model(skewed_triangle_nodes(), Some(vec![0.3, -0.7, 0.4]), false);
    for node in &mut model.nodes {
        node.positive_potential.value = 2.0 * node.position.x;
        node.negative_potential.value = 5.0 * node.position.y;
    }
    let element = &model.elements[0];

    // Upper potentials: nodes 0 and 2 positive face, node 1 negative face, and vice versa
    let upper = element.velocity(&model.nodes).unwrap();
    let lower = element.lower_side_velocity(&model.nodes).unwrap();
    let geometry = SimplexGeometry::Triangle3;
    let positions: Vec<_> = model.nodes.iter().map(|node| node.position).collect();
    let data = GeometryData::compute(geometry, &geometry.coordinate_matrix(&positions)).unwrap();
    let phi_upper = DVector::from_column_slice(&[
        2.0 * positions[0].x,
        5.0 * positions[1].y,
        2.0 * positions[2].x,
    ]);
    let phi_lower = DVector::from_column_slice(&[
        5.0 * positions[0].y,
        2.0 * positions[1].x,
        5.0 * positions[2].y,
    ]);
    assert_matrix_eq!(upper, data.gradient(&phi_upper), comp = abs, tol = 1e-12);
    assert_matrix_eq!(lower, data.gradient(&phi_lower), comp = abs, tol = 1e-12);
}

#[test]
fn compressible_wake_system_matches_partitioned_reference() {
    let conditions = FlowConditions {
        compressible: true,
        ..flow_conditions()
    };
    let cases = [
        (skewed_triangle_nodes(), vec![0.3, -0.7, 0.4]),
        (tetrahedron_nodes(), vec![0.5, -0.4, 0.3, -0.2]),
        (tetrahedron_nodes(), vec![-0.5, 0.4, -0.3, -0.2]),
    ];
    for (nodes, distances) in cases {
        for trailing_edge in [false, true] {
            let mut model = single_element_model(nodes.clone(), Some(distances.clone()), trailing_edge);
            set_split_potentials(&mut model, Vector3::new(8.0, 3.0, 1.0), Vector3::new(6.0, -2.0, 0.5));
            let element = &model.elements[0];
            assert_eq!(element.wake_data().unwrap().trailing_edge, trailing_edge);

            let system = element.calculate_local_system(&model.nodes, &conditions).unwrap();
            let (expected_lhs, expected_rhs) = compressible_wake_reference(&model, &conditions);
            assert_matrix_eq!(system.lhs, expected_lhs, comp = abs, tol = 1e-10);
            assert_matrix_eq!(system.rhs, expected_rhs, comp = abs, tol = 1e-10);

            // The residual is built from the density-weighted Laplacian, not from the tangent
            let tangent_residual = -(&system.lhs * split_potentials(&model));
            assert!((tangent_residual - &system.rhs).norm() > 1e-6);
        }
    }
}

#[test]
fn wake_density_is_evaluated_below_the_wake() {
    let conditions = FlowConditions {
        compressible: true,
        ..flow_conditions()
    };
    let mut model = single_element_model(skewed_triangle_nodes(), Some(vec![0.3, -0.7, 0.4]), false);
    set_split_potentials(&mut model, Vector3::new(15.0, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0));
    let element = &model.elements[0];

    let density = element.local_density(&model.nodes, &conditions).unwrap();
    let lower = compute_density_from_speed_squared(&conditions, FREE_STREAM_DENSITY, 4.0).unwrap();
    let upper = compute_density_from_speed_squared(&conditions, FREE_STREAM_DENSITY, 225.0).unwrap();
    assert_scalar_eq!(density, lower.density, comp = abs, tol = 1e-12);
    assert!((upper.density - lower.density).abs() > 1e-4);
}

#[test]
fn boundary_element_becomes_trailing_edge_wake_element() {
    let mut element = PotentialFlowElement::new(4, vec![0, 1, 2], FREE_STREAM_DENSITY).with_boundary(true);
    element.make_wake(vec![0.3, -0.7, 0.4], false).unwrap();
    assert!(element.wake_data().unwrap().trailing_edge);

    let mut element = PotentialFlowElement::new(5, vec![0, 1, 2], FREE_STREAM_DENSITY);
    element.make_wake(vec![0.3, -0.7, 0.4], false).unwrap();
    assert!(!element.wake_data().unwrap().trailing_edge);
}
