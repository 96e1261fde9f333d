use crate::domain::{
    ConstraintSet, ConstraintViolation, MarginGrouping, OptimizerConfig, Platform, Solution,
    SolveStats, synthesize_initial_guess, validate_config, validate_platforms,
};
use crate::error::Result;
use crate::heuristic::greedy_separation;
use crate::optimization::{
    NoopCallback, OptimizationCallback, PricingCallback, PricingProblem, Problem, SolverResult,
    select_solver,
};
use crate::report::build_solution;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Everything derived from a catalog before the solver runs.
#[derive(Clone, Debug)]
pub struct PreparedRun {
    pub grouping: MarginGrouping,
    pub constraints: ConstraintSet,
    pub initial_guess: Vec<f64>,
}

/// Pricing engine: validate, group, build constraints, seed, solve, report.
///
/// Holds only configuration, so one instance can serve any number of
/// concurrent runs.
#[derive(Clone, Debug, Default)]
pub struct PricingOptimizer {
    config: OptimizerConfig,
}

impl PricingOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Run one optimisation.
    ///
    /// Only malformed input is an `Err`; solver failure comes back as an
    /// infeasible [`Solution`] carrying the solver's message.
    pub fn optimize(&self, platforms: &[Platform]) -> Result<Solution> {
        self.optimize_with_callback(platforms, &mut NoopCallback)
    }

    /// Same as [`optimize`](Self::optimize), forwarding every solver
    /// iteration to `observer`.
    pub fn optimize_with_callback(
        &self,
        platforms: &[Platform],
        observer: &mut dyn OptimizationCallback,
    ) -> Result<Solution> {
        let prepared = self.prepare(platforms)?;
        let config = &self.config;

        let problem = PricingProblem::new(
            platforms,
            &prepared.constraints,
            config,
            prepared.initial_guess.clone(),
        );

        let (mut solver, reason) = select_solver(
            config.mode,
            platforms.len(),
            config.max_iterations,
            config.tolerance,
        );
        debug!(solver = solver.name(), %reason, "solver selected");

        let param_names: Vec<String> = platforms.iter().map(|p| p.name.clone()).collect();
        let mut callback = PricingCallback::new(config.verbose, param_names).with_observer(observer);

        let result = solver.solve(&problem, &mut callback);
        // Penalty mode only hands bounds to the solver; report against every rule
        let max_violation = if result.params.len() == platforms.len() {
            prepared.constraints.max_violation(&result.params)
        } else {
            result.max_violation
        };
        let stats = SolveStats {
            solver: solver.name().to_string(),
            iterations: result.iterations,
            cost_evals: result.cost_evals,
            grad_evals: result.grad_evals,
            max_violation,
        };

        if let Some(diagnostic) =
            self.check_result(platforms, &prepared.constraints, &problem, &result)
        {
            warn!(
                solver = %stats.solver,
                iterations = stats.iterations,
                %diagnostic,
                "no feasible pricing"
            );
            return Ok(Solution::infeasible(diagnostic, stats));
        }

        let solution = build_solution(platforms, &prepared.grouping, config, result.params, stats);
        info!(
            mode = config.mode.as_str(),
            total_royalty = solution.total_royalty,
            iterations = solution.stats.iterations,
            warnings = solution.warnings.len(),
            "pricing optimised"
        );
        Ok(solution)
    }

    /// Validate the input and build grouping, constraints and seed.
    pub fn prepare(&self, platforms: &[Platform]) -> Result<PreparedRun> {
        validate_platforms(platforms)?;
        validate_config(&self.config, platforms.len())?;

        let margins: Vec<f64> = platforms.iter().map(|p| p.margin).collect();
        let grouping = MarginGrouping::from_margins(&margins);
        let constraints = ConstraintSet::build(platforms, &grouping, &self.config);
        let initial_guess = match &self.config.initial_guess {
            Some(seed) => seed.clone(),
            None => synthesize_initial_guess(platforms, &grouping),
        };

        debug!(
            platforms = platforms.len(),
            tiers = grouping.num_tiers(),
            constraints = constraints.len(),
            "run prepared"
        );

        Ok(PreparedRun {
            grouping,
            constraints,
            initial_guess,
        })
    }

    /// Constraints the seed already breaks. Diagnostic only; nothing is repaired.
    pub fn violations_at_initial_guess(
        &self,
        platforms: &[Platform],
    ) -> Result<Vec<ConstraintViolation>> {
        let prepared = self.prepare(platforms)?;
        Ok(prepared.constraints.violations(
            &prepared.initial_guess,
            self.config.constraint_tolerance,
            platforms,
        ))
    }

    /// One independent run per separation value, in parallel. Results keep
    /// the order of `min_royalty_diffs`.
    pub fn sweep_min_royalty_diff(
        &self,
        platforms: &[Platform],
        min_royalty_diffs: &[f64],
    ) -> Result<Vec<(f64, Solution)>> {
        validate_platforms(platforms)?;

        min_royalty_diffs
            .par_iter()
            .map(|&min_royalty_diff| {
                let optimizer =
                    Self::new(self.config.clone().with_min_royalty_diff(min_royalty_diff));
                optimizer
                    .optimize(platforms)
                    .map(|solution| (min_royalty_diff, solution))
            })
            .collect()
    }

    /// Optimise several catalogs in parallel with this configuration.
    pub fn optimize_many(&self, catalogs: &[Vec<Platform>]) -> Vec<Result<Solution>> {
        catalogs
            .par_iter()
            .map(|platforms| self.optimize(platforms))
            .collect()
    }

    /// Price with the greedy tier walk instead of a solver.
    ///
    /// The walk ignores spread and prices same-margin platforms as a
    /// staircase, so its answer is checked against the full constraint set
    /// like any solver output.
    pub fn greedy_baseline(&self, platforms: &[Platform]) -> Result<Solution> {
        let prepared = self.prepare(platforms)?;
        let prices = greedy_separation(platforms, self.config.min_royalty_diff);

        let bounds: Vec<(f64, f64)> = platforms.iter().map(|p| p.bounds).collect();
        let stats = SolveStats {
            solver: "GreedySeparation".to_string(),
            max_violation: prepared.constraints.max_violation(&prices),
            ..SolveStats::default()
        };

        if let Some(broken) = self.broken_rules(&prepared.constraints, &prices, &bounds, platforms) {
            let diagnostic = format!("Greedy pricing {broken}");
            warn!(%diagnostic, "greedy baseline infeasible");
            return Ok(Solution::infeasible(diagnostic, stats));
        }

        Ok(build_solution(
            platforms,
            &prepared.grouping,
            &self.config,
            prices,
            stats,
        ))
    }

    /// Absolute slack allowed on hard constraints, scaled to the price range.
    fn feasibility_tolerance(&self, bounds: &[(f64, f64)]) -> f64 {
        let scale = bounds
            .iter()
            .map(|&(min, max)| min.abs().max(max.abs()))
            .fold(0.0, f64::max);
        self.config.constraint_tolerance * (1.0 + scale)
    }

    /// "violates N constraint(s): ..." when `prices` break any rule beyond tolerance.
    fn broken_rules(
        &self,
        constraints: &ConstraintSet,
        prices: &[f64],
        bounds: &[(f64, f64)],
        platforms: &[Platform],
    ) -> Option<String> {
        let violations = constraints.violations(prices, self.feasibility_tolerance(bounds), platforms);
        if violations.is_empty() {
            return None;
        }
        let listed: Vec<&str> = violations.iter().map(|v| v.description.as_str()).collect();
        Some(format!(
            "violates {} constraint(s): {}",
            violations.len(),
            listed.join("; ")
        ))
    }

    /// `None` when the result is usable, otherwise the diagnostic.
    ///
    /// Checks the full constraint set, not just what the solver saw.
    fn check_result(
        &self,
        platforms: &[Platform],
        constraints: &ConstraintSet,
        problem: &PricingProblem,
        result: &SolverResult,
    ) -> Option<String> {
        if !result.success {
            return Some(result.message.clone());
        }
        if result.params.len() != problem.num_params() {
            return Some(format!(
                "Solver returned {} prices for {} platforms",
                result.params.len(),
                problem.num_params()
            ));
        }
        if result.params.iter().any(|p| !p.is_finite()) {
            return Some("Solver returned non-finite prices".to_string());
        }

        self.broken_rules(constraints, &result.params, problem.bounds(), platforms)
            .map(|broken| format!("Infeasible: {} pricing {broken}", self.config.mode.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObjectiveStrategy;
    use crate::error::InputError;
    use crate::optimization::FnCallback;

    fn two_tiers() -> Vec<Platform> {
        vec![
            Platform::new("Direct", 0.8, 10.0, 20.0),
            Platform::new("Store", 0.7, 10.0, 30.0),
        ]
    }

    #[test]
    fn binding_separation_is_met_exactly() {
        let solution = PricingOptimizer::default().optimize(&two_tiers()).unwrap();
        assert!(solution.feasible);
        assert!((solution.prices[0] - 20.0).abs() < 1e-9);
        // 16 - 0.5 = 0.7 * p1
        assert!((solution.prices[1] - 15.5 / 0.7).abs() < 1e-9);
        assert_eq!(solution.ranking, vec![1, 2]);
        assert_eq!(solution.stats.solver, "LinearProgram");
    }

    #[test]
    fn invalid_config_is_rejected_before_solving() {
        let optimizer = PricingOptimizer::new(OptimizerConfig::default().with_initial_guess(vec![1.0]));
        let err = optimizer.optimize(&two_tiers()).unwrap_err();
        assert_eq!(
            err,
            InputError::InitialGuessLength {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn infeasible_run_has_no_prices() {
        let optimizer =
            PricingOptimizer::new(OptimizerConfig::default().with_min_royalty_diff(20.0));
        let solution = optimizer.optimize(&two_tiers()).unwrap();
        assert!(!solution.feasible);
        assert!(solution.prices.is_empty());
        assert!(solution.entries.is_empty());
        assert!(solution.diagnostic.unwrap().contains("infeasible"));
    }

    #[derive(Default)]
    struct Outcome {
        finished: Option<bool>,
    }

    impl OptimizationCallback for Outcome {
        fn on_iteration(&mut self, _iteration: u32, _params: &[f64], _cost: f64) {}

        fn on_finish(&mut self, result: &SolverResult) {
            self.finished = Some(result.success);
        }
    }

    #[test]
    fn infeasible_hard_run_still_finishes_the_observer() {
        let optimizer =
            PricingOptimizer::new(OptimizerConfig::default().with_min_royalty_diff(20.0));
        let mut outcome = Outcome::default();
        let solution = optimizer
            .optimize_with_callback(&two_tiers(), &mut outcome)
            .unwrap();
        assert!(!solution.feasible);
        assert_eq!(outcome.finished, Some(false));
    }

    #[test]
    fn penalty_run_is_checked_against_every_rule() {
        // Best achievable gap is 0.8 * 20 - 0.7 * 10 = 9
        let config = OptimizerConfig::default()
            .with_mode(ObjectiveStrategy::PenaltyAugmented)
            .with_min_royalty_diff(20.0)
            .with_tolerance(1e-5)
            .with_max_iterations(20_000);
        let solution = PricingOptimizer::new(config).optimize(&two_tiers()).unwrap();
        assert!(!solution.feasible);
        assert!(solution.prices.is_empty());
        assert!(solution.stats.max_violation > 10.0);
        let diagnostic = solution.diagnostic.unwrap();
        assert!(diagnostic.contains("penalty_augmented"), "{diagnostic}");
        assert!(diagnostic.contains("royalty of 'Direct'"), "{diagnostic}");
    }

    #[test]
    fn observer_sees_iterations() {
        let mut calls = 0;
        let config = OptimizerConfig::default()
            .with_mode(ObjectiveStrategy::PenaltyAugmented)
            .with_tolerance(1e-4)
            .with_max_iterations(5000);
        let mut observer = FnCallback(|_: u32, _: &[f64], _: f64| calls += 1);
        let solution = PricingOptimizer::new(config)
            .optimize_with_callback(&two_tiers(), &mut observer)
            .unwrap();
        assert!(solution.feasible);
        assert!(calls > 0);
    }

    #[test]
    fn initial_guess_violations_are_listed() {
        // Seed both at the same royalty
        let optimizer = PricingOptimizer::new(
            OptimizerConfig::default().with_initial_guess(vec![14.0, 16.0]),
        );
        let violations = optimizer.violations_at_initial_guess(&two_tiers()).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].value < 0.0);
    }

    #[test]
    fn synthesized_seed_respects_bounds() {
        let prepared = PricingOptimizer::default().prepare(&two_tiers()).unwrap();
        assert_eq!(prepared.initial_guess.len(), 2);
        assert_eq!(prepared.grouping.num_tiers(), 2);
        for (price, platform) in prepared.initial_guess.iter().zip(two_tiers()) {
            assert!(platform.is_within_bounds(*price, 0.0));
        }
    }

    #[test]
    fn greedy_baseline_matches_the_optimum_on_two_tiers() {
        let optimizer = PricingOptimizer::default();
        let greedy = optimizer.greedy_baseline(&two_tiers()).unwrap();
        let exact = optimizer.optimize(&two_tiers()).unwrap();
        assert!(greedy.feasible);
        assert_eq!(greedy.stats.solver, "GreedySeparation");
        for (g, e) in greedy.prices.iter().zip(&exact.prices) {
            assert!((g - e).abs() < 1e-9);
        }
    }

    #[test]
    fn greedy_baseline_reports_staircase_spread() {
        // Each step drops 1 / 0.7 in price; four steps overrun the 5.0 window
        let platforms: Vec<Platform> = ["A", "B", "C", "D", "E"]
            .into_iter()
            .map(|name| Platform::new(name, 0.7, 10.0, 28.0))
            .collect();
        let optimizer =
            PricingOptimizer::new(OptimizerConfig::default().with_min_royalty_diff(1.0));
        let solution = optimizer.greedy_baseline(&platforms).unwrap();
        assert!(!solution.feasible);
        assert!(solution.prices.is_empty());
        assert!(solution
            .diagnostic
            .unwrap()
            .contains("price of 'A' exceeds price of 'E'"));
    }
}
