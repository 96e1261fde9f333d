mod linear;
mod projected_gradient;
pub mod traits;

pub use linear::LinearProgramSolver;
pub use projected_gradient::ProjectedGradientOptimizer;
pub use traits::{NoopCallback, OptimizationCallback, Problem, Solver, SolverResult};

use crate::domain::ObjectiveStrategy;

/// Pick the solver for a formulation, with a reason for the logs.
pub fn select_solver(
    strategy: ObjectiveStrategy,
    num_params: usize,
    max_iterations: u32,
    precision: f64,
) -> (Box<dyn Solver>, String) {
    match strategy {
        // Linear cost, linear constraints: exact vertex solution
        ObjectiveStrategy::HardConstraint => (
            Box::new(LinearProgramSolver::new()),
            format!("{num_params} prices, linear program → good_lp (microlp)"),
        ),
        // Smooth cost over a box
        ObjectiveStrategy::PenaltyAugmented => {
            let memory = if num_params <= 8 { 5 } else { 10 };
            (
                Box::new(ProjectedGradientOptimizer::new(max_iterations, precision).with_memory(memory)),
                format!(
                    "{num_params} prices, smooth penalty objective → spectral projected gradient (memory={memory})"
                ),
            )
        }
    }
}
