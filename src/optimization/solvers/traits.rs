use crate::domain::Constraint;

#[derive(Clone, Debug)]
pub struct SolverResult {
    pub success: bool,
    pub cost: f64,
    pub iterations: u32,
    pub message: String,
    pub params: Vec<f64>,
    pub cost_evals: usize,
    pub grad_evals: usize,
    /// Largest violation of `Problem::constraints` at `params`.
    pub max_violation: f64,
}

/// Observer for optimization progress.
///
/// Receives values the solver already computed; implementations must not
/// influence the run.
pub trait OptimizationCallback {
    /// Called at each iteration with current parameters and cost
    fn on_iteration(&mut self, iteration: u32, params: &[f64], cost: f64);

    /// Called once with the raw solver outcome.
    fn on_finish(&mut self, _result: &SolverResult) {}
}

/// Callback that ignores everything.
pub struct NoopCallback;

impl OptimizationCallback for NoopCallback {
    fn on_iteration(&mut self, _iteration: u32, _params: &[f64], _cost: f64) {}
}

/// Core problem definition: a cost to minimize over a box, plus inequality
/// constraints `g(x) >= 0`.
pub trait Problem {
    /// Evaluate cost for given parameters
    fn cost(&self, params: &[f64]) -> f64;

    /// Write the cost gradient into `grad`
    fn gradient(&self, params: &[f64], grad: &mut [f64]);

    /// Cost coefficients when the cost is linear, `None` otherwise
    fn linear_cost(&self) -> Option<&[f64]> {
        None
    }

    /// Number of parameters
    fn num_params(&self) -> usize;

    /// Initial parameter values
    fn initial_params(&self) -> &[f64];

    /// Parameter bounds (min, max) for each parameter
    fn bounds(&self) -> &[(f64, f64)];

    /// Hard constraints the solution must satisfy
    fn constraints(&self) -> &[Constraint];
}

/// Solver interface - takes problem and callback
pub trait Solver: Send {
    fn name(&self) -> &str;

    /// Solve the optimization problem with callback for progress tracking.
    ///
    /// Infeasibility and non-convergence are reported through `success` and
    /// `message`, never as a panic.
    fn solve(&mut self, problem: &dyn Problem, callback: &mut dyn OptimizationCallback)
    -> SolverResult;
}

#[inline]
pub fn clamp_params(params: &mut [f64], bounds: &[(f64, f64)]) {
    for (p, &(min, max)) in params.iter_mut().zip(bounds) {
        *p = p.clamp(min, max);
    }
}
