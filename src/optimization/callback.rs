use super::solvers::traits::{OptimizationCallback, SolverResult};
use tracing::{debug, info};

/// Callback for tracking and tracing pricing optimization progress.
///
/// Optionally forwards every event to a caller-supplied observer.
pub struct PricingCallback<'a> {
    verbose: bool,
    iteration_count: u32,
    param_names: Vec<String>,
    observer: Option<&'a mut dyn OptimizationCallback>,
}

impl<'a> PricingCallback<'a> {
    pub fn new(verbose: bool, param_names: Vec<String>) -> Self {
        Self {
            verbose,
            iteration_count: 0,
            param_names,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: &'a mut dyn OptimizationCallback) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn iterations(&self) -> u32 {
        self.iteration_count
    }

    /// Log optimization summary
    pub fn log_summary(&self, result: &SolverResult) {
        if !self.verbose {
            return;
        }
        info!(
            success = result.success,
            reason = %result.message,
            iterations = result.iterations,
            cost = result.cost,
            max_violation = result.max_violation,
            "optimization summary"
        );
        for (name, &value) in self.param_names.iter().zip(result.params.iter()) {
            info!(platform = %name, price = value, "final price");
        }
    }
}

impl OptimizationCallback for PricingCallback<'_> {
    fn on_iteration(&mut self, iteration: u32, params: &[f64], cost: f64) {
        self.iteration_count = iteration;

        if self.verbose {
            debug!(iteration, cost, "iteration");
        }

        if let Some(observer) = self.observer.as_mut() {
            observer.on_iteration(iteration, params, cost);
        }
    }

    fn on_finish(&mut self, result: &SolverResult) {
        self.log_summary(result);
        if let Some(observer) = self.observer.as_mut() {
            observer.on_finish(result);
        }
    }
}

/// Adapts a closure into an [`OptimizationCallback`].
pub struct FnCallback<F>(pub F);

impl<F> OptimizationCallback for FnCallback<F>
where
    F: FnMut(u32, &[f64], f64),
{
    fn on_iteration(&mut self, iteration: u32, params: &[f64], cost: f64) {
        (self.0)(iteration, params, cost);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        finished: Option<bool>,
    }

    impl OptimizationCallback for Recorder {
        fn on_iteration(&mut self, _iteration: u32, _params: &[f64], _cost: f64) {}

        fn on_finish(&mut self, result: &SolverResult) {
            self.finished = Some(result.success);
        }
    }

    #[test]
    fn counts_and_forwards_iterations() {
        let mut seen = Vec::new();
        {
            let mut observer = FnCallback(|iteration: u32, _params: &[f64], cost: f64| {
                seen.push((iteration, cost));
            });
            let mut callback =
                PricingCallback::new(false, vec!["A".into()]).with_observer(&mut observer);

            callback.on_iteration(1, &[10.0], -5.0);
            callback.on_iteration(2, &[20.0], -10.0);
            assert_eq!(callback.iterations(), 2);
        }
        assert_eq!(seen, vec![(1, -5.0), (2, -10.0)]);
    }

    #[test]
    fn finish_reaches_the_observer() {
        let mut recorder = Recorder::default();
        {
            let mut callback = PricingCallback::new(true, vec!["A".into()]).with_observer(&mut recorder);
            callback.on_iteration(1, &[1.0], 0.0);
            callback.on_finish(&SolverResult {
                success: false,
                cost: 0.0,
                iterations: 1,
                message: "Problem is infeasible".into(),
                params: vec![1.0],
                cost_evals: 1,
                grad_evals: 0,
                max_violation: 2.0,
            });
        }
        assert_eq!(recorder.finished, Some(false));
    }
}
