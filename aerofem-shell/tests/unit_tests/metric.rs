use super::{flat_patch, patch_nodes};
use aerofem::nalgebra::{DMatrix, Vector3};
use aerofem_shell::basis::lagrange_quadrilateral_integration_points;
use aerofem_shell::metric::MetricVariables;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};

fn center_metric(nodes: &[aerofem_shell::node::ShellNode<f64>]) -> Option<MetricVariables<f64>> {
    let points = lagrange_quadrilateral_integration_points(2, 1).unwrap();
    let positions: Vec<_> = nodes.iter().map(|node| node.reference_position).collect();
    MetricVariables::compute(&points[0], &positions)
}

#[test]
fn flat_patch_metric() {
    let metric = center_metric(&flat_patch()).unwrap();
    assert_matrix_eq!(metric.g1, Vector3::new(0.5, 0.0, 0.0), comp = abs, tol = 1e-14);
    assert_matrix_eq!(metric.g2, Vector3::new(0.0, 0.5, 0.0), comp = abs, tol = 1e-14);
    assert_matrix_eq!(metric.g3, Vector3::new(0.0, 0.0, 1.0), comp = abs, tol = 1e-14);
    assert_scalar_eq!(metric.da, 0.25, comp = abs, tol = 1e-14);
    assert_matrix_eq!(metric.gab, Vector3::new(0.25, 0.25, 0.0), comp = abs, tol = 1e-14);
    assert_matrix_eq!(metric.gab_con, Vector3::new(4.0, 4.0, 0.0), comp = abs, tol = 1e-12);
    assert_matrix_eq!(metric.curvature, Vector3::zeros(), comp = abs, tol = 1e-14);
}

#[test]
fn flat_patch_strain_transformation_rescales_components() {
    let metric = center_metric(&flat_patch()).unwrap();
    let expected = DMatrix::from_diagonal(&aerofem::nalgebra::DVector::from_vec(vec![4.0, 4.0, 8.0, 4.0, 4.0]));
    assert_matrix_eq!(metric.strain_transformation(5), expected, comp = abs, tol = 1e-12);
    assert_eq!(metric.strain_transformation(3).nrows(), 3);
}

#[test]
fn skewed_base_transformation_recovers_cartesian_strain() {
    // A sheared parallelogram: x = xi_1 + 0.5 xi_2, y = xi_2 (on the centered patch)
    let nodes = patch_nodes(0.0, 1, |_, _| 0.0)
        .into_iter()
        .map(|mut node| {
            let p = node.reference_position;
            node.reference_position = Vector3::new(p.x + 0.5 * p.y, p.y, 0.0);
            node
        })
        .collect::<Vec<_>>();
    let metric = center_metric(&nodes).unwrap();
    let q = metric.strain_transformation(3);

    // Cartesian strain eps = [0.01, -0.02, 0.03] (engineering shear) mapped to curvilinear
    // components E_ab = g_a . eps . g_b
    let eps = aerofem::nalgebra::Matrix3::new(0.01, 0.015, 0.0, 0.015, -0.02, 0.0, 0.0, 0.0, 0.0);
    let e1 = metric.g1.normalize();
    let e2 = metric.g3.cross(&e1);
    let frame = aerofem::nalgebra::Matrix3::from_columns(&[e1, e2, metric.g3]);
    let global = frame * eps * frame.transpose();
    let curvilinear = aerofem::nalgebra::DVector::from_vec(vec![
        metric.g1.dot(&(global * metric.g1)),
        metric.g2.dot(&(global * metric.g2)),
        metric.g1.dot(&(global * metric.g2)),
    ]);
    let cartesian = q * curvilinear;
    assert_matrix_eq!(
        cartesian,
        aerofem::nalgebra::DVector::from_vec(vec![0.01, -0.02, 0.03]),
        comp = abs,
        tol = 1e-12
    );
}

#[test]
fn paraboloid_curvature() {
    let a: f64 = 0.8;
    let metric = center_metric(&patch_nodes(0.0, 1, |x, _| a * x * x)).unwrap();
    assert_matrix_eq!(metric.g1, Vector3::new(0.5, 0.0, 0.5 * a), comp = abs, tol = 1e-14);
    let expected_normal = Vector3::new(-a, 0.0, 1.0) / (1.0 + a * a).sqrt();
    assert_matrix_eq!(metric.g3, expected_normal, comp = abs, tol = 1e-14);
    assert_scalar_eq!(metric.curvature[0], 0.5 * a / (1.0 + a * a).sqrt(), comp = abs, tol = 1e-14);
    assert_scalar_eq!(metric.curvature[1], 0.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(metric.curvature[2], 0.0, comp = abs, tol = 1e-14);
}

#[test]
fn collapsed_patch_has_no_metric() {
    let nodes = patch_nodes(0.0, 1, |_, _| 0.0)
        .into_iter()
        .map(|mut node| {
            node.reference_position.y = 0.0;
            node
        })
        .collect::<Vec<_>>();
    assert!(center_metric(&nodes).is_none());
}
