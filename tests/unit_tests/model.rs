use super::{flow_conditions, structured_triangle_model};
use aerofem::model::PotentialFlowModel;
use aerofem::nalgebra::{DVector, Vector3};
use aerofem::node::NodeFlags;
use aerofem::wake::WakeSurface;

/// 6 x 4 cells of size 0.5 around the origin, with no grid line on the wake.
fn model_around_trailing_edge() -> PotentialFlowModel<f64> {
    structured_triangle_model(6, 4, [-1.5, -1.1], 0.5)
}

fn node_at(model: &PotentialFlowModel<f64>, x: f64, y: f64) -> usize {
    model
        .nodes
        .iter()
        .position(|node| (node.position - Vector3::new(x, y, 0.0)).norm() < 1e-9)
        .unwrap()
}

#[test]
fn define_wake_marks_cut_elements_downstream_of_trailing_edge() {
    let conditions = flow_conditions();
    let mut model = model_around_trailing_edge();
    let surface = WakeSurface::from_free_stream_2d(Vector3::zeros(), &conditions.free_stream_velocity);

    let num_wake_elements = model.define_wake(&surface).unwrap();
    assert_eq!(num_wake_elements, 6);

    for element in &model.elements {
        let positions: Vec<_> = element.nodes.iter().map(|&i| model.nodes[i].position).collect();
        let centroid_x = positions.iter().map(|p| p.x).sum::<f64>() / 3.0;
        let crosses_wake = positions.iter().any(|p| p.y > 0.0) && positions.iter().any(|p| p.y < 0.0);
        assert_eq!(element.is_wake(), crosses_wake && centroid_x > 0.0);
        if let Some(wake) = element.wake_data() {
            assert!(!wake.trailing_edge);
            for (distance, position) in wake.distances.iter().zip(&positions) {
                assert_eq!(*distance, position.y);
            }
        }
    }
}

#[test]
fn define_wake_classifies_trailing_edge_elements() {
    let conditions = flow_conditions();
    let mut model = model_around_trailing_edge();
    let trailing_edge = node_at(&model, 0.0, -0.1);
    let lower_surface = node_at(&model, 0.5, -0.1);
    model.nodes[trailing_edge].flags = NodeFlags {
        structure: true,
        boundary: true,
    };
    model.nodes[lower_surface].flags.boundary = true;

    let surface = WakeSurface::from_free_stream_2d(Vector3::new(0.0, 0.0, 0.0), &conditions.free_stream_velocity);
    model.define_wake(&surface).unwrap();

    let trailing_edge_elements: Vec<_> = model
        .elements
        .iter()
        .filter(|element| element.wake_data().map_or(false, |wake| wake.trailing_edge))
        .collect();
    assert_eq!(trailing_edge_elements.len(), 1);
    assert!(trailing_edge_elements[0].nodes.contains(&trailing_edge));
    assert!(trailing_edge_elements[0].nodes.contains(&lower_surface));
}

#[test]
fn redefining_the_wake_resets_previous_classification() {
    let mut model = model_around_trailing_edge();
    let surface = WakeSurface::from_free_stream_2d(Vector3::zeros(), &Vector3::new(1.0, 0.0, 0.0));
    model.define_wake(&surface).unwrap();

    // A wake leaving the domain upstream cuts nothing downstream
    let upstream = WakeSurface::from_free_stream_2d(Vector3::new(5.0, 0.0, 0.0), &Vector3::new(1.0, 0.0, 0.0));
    assert_eq!(model.define_wake(&upstream).unwrap(), 0);
    assert!(model.elements.iter().all(|element| !element.is_wake()));
}

#[test]
fn number_dofs_adds_negative_faces_for_wake_nodes() {
    let conditions = flow_conditions();
    let mut model = model_around_trailing_edge();
    assert_eq!(model.number_dofs(), 35);
    assert_eq!(model.num_equations(), 35);
    assert!(model.nodes.iter().all(|node| node.negative_potential.equation_id.is_none()));

    let surface = WakeSurface::from_free_stream_2d(Vector3::zeros(), &conditions.free_stream_velocity);
    model.define_wake(&surface).unwrap();
    assert_eq!(model.number_dofs(), 43);
    assert_eq!(model.num_equations(), 43);

    let wake_node = node_at(&model, 1.0, 0.4);
    assert!(model.nodes[wake_node].negative_potential.equation_id.is_some());
    let upstream_node = node_at(&model, -1.0, 0.4);
    assert!(model.nodes[upstream_node].negative_potential.equation_id.is_none());

    model.check(&conditions).unwrap();
}

#[test]
fn check_fails_before_numbering() {
    let model = model_around_trailing_edge();
    let error = model.check(&flow_conditions()).unwrap_err();
    assert!(format!("{:?}", error).contains("never numbered"));
}

#[test]
fn apply_increment_updates_numbered_unknowns() {
    let conditions = flow_conditions();
    let mut model = model_around_trailing_edge();
    let surface = WakeSurface::from_free_stream_2d(Vector3::zeros(), &conditions.free_stream_velocity);
    model.define_wake(&surface).unwrap();
    let num_equations = model.number_dofs();

    let increment = DVector::from_fn(num_equations, |i, _| i as f64);
    model.apply_increment(&increment).unwrap();
    for node in &model.nodes {
        let positive_id = node.positive_potential.equation_id.unwrap();
        assert_eq!(node.positive_potential.value, positive_id as f64);
        match node.negative_potential.equation_id {
            Some(id) => assert_eq!(node.negative_potential.value, id as f64),
            None => assert_eq!(node.negative_potential.value, 0.0),
        }
    }

    assert!(model.apply_increment(&DVector::zeros(3)).is_err());
}

#[test]
fn free_stream_potential_initialization() {
    let conditions = flow_conditions();
    let mut model = model_around_trailing_edge();
    model.initialize_free_stream_potential(&conditions);
    for node in &model.nodes {
        assert_eq!(node.positive_potential.value, 100.0 * node.position.x);
        assert_eq!(node.negative_potential.value, 100.0 * node.position.x);
    }
}
