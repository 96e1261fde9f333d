use super::traits::{OptimizationCallback, Problem, Solver, SolverResult, clamp_params};
use crate::domain::constraints::max_violation;
use std::collections::VecDeque;

/// Spectral projected gradient over box bounds.
///
/// Barzilai-Borwein step lengths with a non-monotone Armijo line search along
/// the projected direction. Only `Problem::bounds` are enforced; any other
/// constraint has to be folded into the cost.
pub struct ProjectedGradientOptimizer {
    max_iter: u32,
    precision: f64,
    memory: usize,        // Non-monotone window
    armijo_c: f64,        // Sufficient decrease parameter
    min_step: f64,
    max_step: f64,
    max_backtracks: u32,
}

impl ProjectedGradientOptimizer {
    pub fn new(max_iter: u32, precision: f64) -> Self {
        Self {
            max_iter,
            precision,
            memory: 10,
            armijo_c: 1e-4,
            min_step: 1e-12,
            max_step: 1e12,
            max_backtracks: 40,
        }
    }

    /// Configure the non-monotone window (default: 10)
    pub fn with_memory(mut self, memory: usize) -> Self {
        self.memory = memory.max(1);
        self
    }

    /// Infinity norm of `P(x - g) - x`; zero exactly at box-stationary points.
    fn projected_gradient_norm(params: &[f64], grad: &[f64], bounds: &[(f64, f64)]) -> f64 {
        params
            .iter()
            .zip(grad)
            .zip(bounds)
            .map(|((&x, &g), &(min, max))| ((x - g).clamp(min, max) - x).abs())
            .fold(0.0, f64::max)
    }

    fn finish(
        &self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
        success: bool,
        message: &str,
        state: (Vec<f64>, f64, u32, usize, usize),
    ) -> SolverResult {
        let (params, cost, iterations, cost_evals, grad_evals) = state;
        let result = SolverResult {
            success,
            cost,
            iterations,
            message: message.to_string(),
            max_violation: max_violation(problem.constraints(), &params),
            params,
            cost_evals,
            grad_evals,
        };
        callback.on_finish(&result);
        result
    }
}

impl Solver for ProjectedGradientOptimizer {
    fn name(&self) -> &str {
        "SpectralProjectedGradient"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> SolverResult {
        let n = problem.num_params();
        let bounds = problem.bounds();

        let mut params = problem.initial_params().to_vec();
        clamp_params(&mut params, bounds);
        let mut gradient = vec![0.0; n];
        let mut trial = vec![0.0; n];
        let mut direction = vec![0.0; n];
        let mut new_gradient = vec![0.0; n];

        let mut cost = problem.cost(&params);
        problem.gradient(&params, &mut gradient);
        let mut cost_evals = 1;
        let mut grad_evals = 1;

        if !cost.is_finite() || gradient.iter().any(|g| !g.is_finite()) {
            return self.finish(
                problem,
                callback,
                false,
                "Objective is not finite at the initial point",
                (params, cost, 0, cost_evals, grad_evals),
            );
        }

        let initial_norm = Self::projected_gradient_norm(&params, &gradient, bounds);
        let mut step = if initial_norm > 0.0 {
            (1.0 / initial_norm).clamp(self.min_step, self.max_step)
        } else {
            1.0
        };
        let mut history: VecDeque<f64> = VecDeque::with_capacity(self.memory);
        history.push_back(cost);

        for iter in 0..self.max_iter {
            let pg_norm = Self::projected_gradient_norm(&params, &gradient, bounds);

            callback.on_iteration(iter + 1, &params, cost);

            if pg_norm <= self.precision {
                return self.finish(
                    problem,
                    callback,
                    true,
                    "Converged",
                    (params, cost, iter + 1, cost_evals, grad_evals),
                );
            }

            for i in 0..n {
                let (min, max) = bounds[i];
                direction[i] = (params[i] - step * gradient[i]).clamp(min, max) - params[i];
            }
            let slope: f64 = gradient.iter().zip(&direction).map(|(g, d)| g * d).sum();

            // Non-monotone reference and a roundoff allowance relative to it
            let reference = history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let fuzz = 10.0 * f64::EPSILON * (1.0 + reference.abs());

            let mut accepted = None;
            if slope < 0.0 {
                let mut lambda = 1.0;
                for _ in 0..self.max_backtracks {
                    for i in 0..n {
                        trial[i] = params[i] + lambda * direction[i];
                    }
                    clamp_params(&mut trial, bounds);
                    let trial_cost = problem.cost(&trial);
                    cost_evals += 1;

                    if trial_cost.is_finite()
                        && trial_cost <= reference + self.armijo_c * lambda * slope + fuzz
                    {
                        accepted = Some(trial_cost);
                        break;
                    }

                    // Safeguarded quadratic interpolation
                    let denom = 2.0 * (trial_cost - cost - lambda * slope);
                    lambda = if trial_cost.is_finite() && denom > 0.0 {
                        let t = -slope * lambda * lambda / denom;
                        if t >= 0.1 * lambda && t <= 0.9 * lambda {
                            t
                        } else {
                            0.5 * lambda
                        }
                    } else {
                        0.5 * lambda
                    };
                }
            }

            let Some(trial_cost) = accepted else {
                // No descent left at floating point resolution
                let stalled_ok = pg_norm <= self.precision.sqrt();
                let message = if stalled_ok {
                    "Converged to numerical precision"
                } else {
                    "Line search failed"
                };
                return self.finish(
                    problem,
                    callback,
                    stalled_ok,
                    message,
                    (params, cost, iter + 1, cost_evals, grad_evals),
                );
            };

            problem.gradient(&trial, &mut new_gradient);
            grad_evals += 1;

            let mut ss = 0.0;
            let mut sy = 0.0;
            for i in 0..n {
                let s = trial[i] - params[i];
                let y = new_gradient[i] - gradient[i];
                ss += s * s;
                sy += s * y;
            }
            step = if sy > 0.0 {
                (ss / sy).clamp(self.min_step, self.max_step)
            } else {
                self.max_step
            };

            params.copy_from_slice(&trial);
            gradient.copy_from_slice(&new_gradient);
            cost = trial_cost;

            if history.len() == self.memory {
                history.pop_front();
            }
            history.push_back(cost);
        }

        self.finish(
            problem,
            callback,
            false,
            "Max iterations reached",
            (params, cost, self.max_iter, cost_evals, grad_evals),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Constraint;
    use crate::optimization::solvers::traits::NoopCallback;

    /// sum((x - target)^2) over a box
    struct Quadratic {
        target: Vec<f64>,
        initial: Vec<f64>,
        bounds: Vec<(f64, f64)>,
    }

    impl Problem for Quadratic {
        fn cost(&self, params: &[f64]) -> f64 {
            params
                .iter()
                .zip(&self.target)
                .map(|(x, t)| (x - t).powi(2))
                .sum()
        }

        fn gradient(&self, params: &[f64], grad: &mut [f64]) {
            for ((g, x), t) in grad.iter_mut().zip(params).zip(&self.target) {
                *g = 2.0 * (x - t);
            }
        }

        fn num_params(&self) -> usize {
            self.target.len()
        }

        fn initial_params(&self) -> &[f64] {
            &self.initial
        }

        fn bounds(&self) -> &[(f64, f64)] {
            &self.bounds
        }

        fn constraints(&self) -> &[Constraint] {
            &[]
        }
    }

    struct Recorder(Vec<f64>);

    impl OptimizationCallback for Recorder {
        fn on_iteration(&mut self, _iteration: u32, _params: &[f64], cost: f64) {
            self.0.push(cost);
        }
    }

    #[test]
    fn projects_unconstrained_minimum_onto_box() {
        let problem = Quadratic {
            target: vec![1.5, -0.8, 2.3, -1.2],
            initial: vec![0.5; 4],
            bounds: vec![(0.0, 2.0); 4],
        };
        let result = ProjectedGradientOptimizer::new(200, 1e-8).solve(&problem, &mut NoopCallback);
        assert!(result.success, "{}", result.message);
        let expected = [1.5, 0.0, 2.0, 0.0];
        for (x, e) in result.params.iter().zip(expected) {
            assert!((x - e).abs() < 1e-6, "{x} vs {e}");
        }
    }

    #[test]
    fn linear_cost_runs_to_the_bound() {
        struct Linear(Vec<(f64, f64)>, Vec<f64>);
        impl Problem for Linear {
            fn cost(&self, params: &[f64]) -> f64 {
                -0.5 * params[0]
            }
            fn gradient(&self, _params: &[f64], grad: &mut [f64]) {
                grad[0] = -0.5;
            }
            fn num_params(&self) -> usize {
                1
            }
            fn initial_params(&self) -> &[f64] {
                &self.1
            }
            fn bounds(&self) -> &[(f64, f64)] {
                &self.0
            }
            fn constraints(&self) -> &[Constraint] {
                &[]
            }
        }

        let problem = Linear(vec![(10.0, 20.0)], vec![19.0]);
        let result = ProjectedGradientOptimizer::new(50, 1e-9).solve(&problem, &mut NoopCallback);
        assert!(result.success);
        assert_eq!(result.params[0], 20.0);
    }

    #[test]
    fn callback_sees_every_iteration() {
        let problem = Quadratic {
            target: vec![3.0, 4.0],
            initial: vec![0.0, 0.0],
            bounds: vec![(-10.0, 10.0); 2],
        };
        let mut recorder = Recorder(Vec::new());
        let result = ProjectedGradientOptimizer::new(100, 1e-10).solve(&problem, &mut recorder);
        assert_eq!(recorder.0.len(), result.iterations as usize);
        assert_eq!(recorder.0[0], 25.0);
    }

    #[test]
    fn reports_iteration_cap() {
        let problem = Quadratic {
            target: vec![3.0, -4.0, 7.0],
            initial: vec![0.0; 3],
            bounds: vec![(-10.0, 10.0); 3],
        };
        let result = ProjectedGradientOptimizer::new(1, 1e-12).solve(&problem, &mut NoopCallback);
        assert!(!result.success);
        assert_eq!(result.message, "Max iterations reached");
    }
}
