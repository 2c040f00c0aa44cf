//! A collection of shell elements sharing a node store.
use crate::element::ShellElement;
use crate::node::{ShellDof, ShellNode};
use crate::Real;
use aerofem::nalgebra::DVector;
use eyre::{eyre, WrapErr};
use log::debug;

pub struct ShellModel<T: Real> {
    pub nodes: Vec<ShellNode<T>>,
    pub elements: Vec<ShellElement<T>>,
}

impl<T: Real> ShellModel<T> {
    pub fn new(nodes: Vec<ShellNode<T>>, elements: Vec<ShellElement<T>>) -> Self {
        Self { nodes, elements }
    }

    /// Initializes every element. Fails on the first element that cannot be initialized.
    pub fn initialize(&mut self) -> eyre::Result<()> {
        let nodes = &self.nodes;
        for element in &mut self.elements {
            let id = element.id;
            element
                .initialize(nodes)
                .wrap_err_with(|| format!("Initialization of shell element {} failed", id))?;
        }
        Ok(())
    }

    /// Numbers the dofs node by node. A node receives as many dofs as the richest
    /// formulation among its elements requires. Returns the number of equations.
    pub fn number_dofs(&mut self) -> usize {
        let mut dofs_per_node = vec![0; self.nodes.len()];
        for element in &self.elements {
            for &index in &element.nodes {
                if let Some(count) = dofs_per_node.get_mut(index) {
                    *count = (*count).max(element.formulation.dofs_per_node());
                }
            }
        }

        let mut next = 0;
        for (node, &count) in self.nodes.iter_mut().zip(&dofs_per_node) {
            for dof in ShellDof::ALL {
                node.equation_ids[dof.index()] = if dof.index() < count {
                    next += 1;
                    Some(next - 1)
                } else {
                    None
                };
            }
        }

        debug!("Numbered {} shell equations for {} nodes", next, self.nodes.len());
        next
    }

    pub fn num_equations(&self) -> usize {
        self.nodes
            .iter()
            .flat_map(|node| node.equation_ids)
            .flatten()
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    /// Adds a solution increment of the global system to the nodal dofs.
    pub fn apply_increment(&mut self, increment: &DVector<T>) -> eyre::Result<()> {
        for node in &mut self.nodes {
            for dof in ShellDof::ALL {
                if let Some(id) = node.equation_ids[dof.index()] {
                    let delta = increment.get(id).ok_or_else(|| {
                        eyre!("Increment has {} entries, equation {} is out of range", increment.len(), id)
                    })?;
                    *node.dof_value_mut(dof) += *delta;
                }
            }
        }
        Ok(())
    }
}
