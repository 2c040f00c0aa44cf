//! Parallel assembly of the global potential flow system.
use crate::error::ElementError;
use crate::model::PotentialFlowModel;
use crate::settings::FlowConditions;
use crate::{LocalSystem, Real};
use eyre::WrapErr;
use log::debug;
use nalgebra::{DVector, Scalar};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::prelude::*;

/// The global tangent matrix and residual of one nonlinear iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSystem<T: Scalar> {
    pub matrix: CsrMatrix<T>,
    pub rhs: DVector<T>,
}

/// Computes the local system of every element in parallel.
///
/// Elements only read the node store, so no synchronization is needed during the sweep.
/// Each local system is returned together with its global equation ids. Failures name the
/// element they occurred in.
pub fn par_compute_local_systems<T: Real>(
    model: &PotentialFlowModel<T>,
    conditions: &FlowConditions<T>,
) -> eyre::Result<Vec<(Vec<usize>, LocalSystem<T>)>> {
    model
        .elements
        .par_iter()
        .map(|element| {
            let local = || -> Result<_, ElementError> {
                let equation_ids = element.equation_ids(&model.nodes)?;
                let system = element.calculate_local_system(&model.nodes, conditions)?;
                Ok((equation_ids, system))
            };
            local().wrap_err_with(|| format!("Local system of element {} failed", element.id))
        })
        .collect()
}

/// Scatters local systems into a global sparse matrix and residual vector.
///
/// Contributions of different elements to the same entry are summed.
pub fn scatter_local_systems<T: Real>(
    num_equations: usize,
    local_systems: &[(Vec<usize>, LocalSystem<T>)],
) -> eyre::Result<GlobalSystem<T>> {
    let mut coo = CooMatrix::new(num_equations, num_equations);
    let mut rhs = DVector::zeros(num_equations);

    for (equation_ids, system) in local_systems {
        if let Some(&id) = equation_ids.iter().find(|&&id| id >= num_equations) {
            eyre::bail!("Equation id {} exceeds the number of equations {}", id, num_equations);
        }
        for (i_local, &i) in equation_ids.iter().enumerate() {
            rhs[i] += system.rhs[i_local];
            for (j_local, &j) in equation_ids.iter().enumerate() {
                coo.push(i, j, system.lhs[(i_local, j_local)]);
            }
        }
    }

    Ok(GlobalSystem {
        matrix: CsrMatrix::from(&coo),
        rhs,
    })
}

/// Assembles the global tangent and residual of the model.
///
/// The model must have been numbered with [`PotentialFlowModel::number_dofs`].
pub fn assemble_global_system<T: Real>(
    model: &PotentialFlowModel<T>,
    conditions: &FlowConditions<T>,
) -> eyre::Result<GlobalSystem<T>> {
    let local_systems = par_compute_local_systems(model, conditions).wrap_err("Element sweep failed")?;
    let num_equations = model.num_equations();
    debug!(
        "Scattering {} local systems into {} equations",
        local_systems.len(),
        num_equations
    );
    scatter_local_systems(num_equations, &local_systems)
}
