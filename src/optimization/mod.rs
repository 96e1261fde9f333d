pub mod callback;
pub mod objective;
pub mod problem;
pub mod solvers;

pub use callback::{FnCallback, PricingCallback};
pub use objective::RoyaltyObjective;
pub use problem::PricingProblem;
pub use solvers::{select_solver, ProjectedGradientOptimizer, LinearProgramSolver};
pub use solvers::{NoopCallback, OptimizationCallback, Problem, Solver, SolverResult};
