//! Linear-program solver backed by good_lp with the pure-Rust microlp backend.

use super::traits::{OptimizationCallback, Problem, Solver, SolverResult, clamp_params};
use crate::domain::constraints::max_violation;
use good_lp::solvers::microlp::microlp;
use good_lp::{
    Expression, ResolutionError, Solution, SolverModel, Variable, constraint, variable, variables,
};

/// Exact solver for a linear cost under linear constraints.
///
/// Each parameter becomes a bounded variable and every `g(x) >= 0` from
/// `Problem::constraints` becomes a row built from its linear terms.
#[derive(Debug, Default, Clone)]
pub struct LinearProgramSolver;

impl LinearProgramSolver {
    pub fn new() -> Self {
        Self
    }

    fn finish(
        &self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
        success: bool,
        message: String,
        params: Vec<f64>,
    ) -> SolverResult {
        let result = SolverResult {
            success,
            cost: problem.cost(&params),
            iterations: 1,
            message,
            max_violation: max_violation(problem.constraints(), &params),
            params,
            cost_evals: 1,
            grad_evals: 0,
        };
        callback.on_finish(&result);
        result
    }
}

fn diagnostic(err: &ResolutionError) -> String {
    match err {
        ResolutionError::Infeasible => {
            "Problem is infeasible: the constraints cannot hold together".to_string()
        }
        ResolutionError::Unbounded => "Problem is unbounded".to_string(),
        other => format!("LP solver failed: {other}"),
    }
}

impl Solver for LinearProgramSolver {
    fn name(&self) -> &str {
        "LinearProgram"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> SolverResult {
        let mut fallback = problem.initial_params().to_vec();
        clamp_params(&mut fallback, problem.bounds());

        let Some(costs) = problem.linear_cost() else {
            return self.finish(
                problem,
                callback,
                false,
                "Linear program requires a linear objective".into(),
                fallback,
            );
        };

        let mut vars = variables!();
        let prices: Vec<Variable> = problem
            .bounds()
            .iter()
            .map(|&(min, max)| vars.add(variable().min(min).max(max)))
            .collect();

        let objective: Expression = prices.iter().zip(costs).map(|(&p, &c)| c * p).sum();
        let mut model = vars.minimise(&objective).using(microlp);

        for c in problem.constraints() {
            let (terms, offset) = c.linear_terms();
            let lhs: Expression = terms.iter().map(|&(i, a)| a * prices[i]).sum();
            let rhs = -offset;
            model = model.with(constraint!(lhs >= rhs));
        }

        match model.solve() {
            Ok(solution) => {
                let mut params: Vec<f64> = prices.iter().map(|&p| solution.value(p)).collect();
                clamp_params(&mut params, problem.bounds());
                callback.on_iteration(1, &params, problem.cost(&params));
                self.finish(
                    problem,
                    callback,
                    true,
                    "Optimal solution found".into(),
                    params,
                )
            }
            Err(err) => self.finish(problem, callback, false, diagnostic(&err), fallback),
        }
    }
}
