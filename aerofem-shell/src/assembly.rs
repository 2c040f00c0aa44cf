//! Parallel assembly of the global shell system.
use crate::error::ShellError;
use crate::model::ShellModel;
use crate::Real;
use aerofem::assembly::{scatter_local_systems, GlobalSystem};
use aerofem::LocalSystem;
use eyre::WrapErr;
use log::debug;
use rayon::prelude::*;

/// Computes the local system of every element in parallel, paired with its equation ids.
pub fn par_compute_local_systems<T: Real>(
    model: &ShellModel<T>,
) -> Result<Vec<(Vec<usize>, LocalSystem<T>)>, ShellError> {
    model
        .elements
        .par_iter()
        .map(|element| {
            let equation_ids = element.equation_ids(&model.nodes)?;
            let system = element.calculate_local_system(&model.nodes)?;
            Ok((equation_ids, system))
        })
        .collect()
}

/// Assembles the global tangent and residual of an initialized and numbered model.
pub fn assemble_global_system<T: Real>(model: &ShellModel<T>) -> eyre::Result<GlobalSystem<T>> {
    let local_systems = par_compute_local_systems(model).wrap_err("Shell element sweep failed")?;
    let num_equations = model.num_equations();
    debug!(
        "Scattering {} shell local systems into {} equations",
        local_systems.len(),
        num_equations
    );
    scatter_local_systems(num_equations, &local_systems)
}
