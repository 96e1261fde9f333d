use super::objective::RoyaltyObjective;
use super::solvers::traits::Problem;
use crate::domain::{Constraint, ConstraintSet, ObjectiveStrategy, OptimizerConfig, Platform};
use tracing::debug;

/// Pricing problem handed to a solver: objective, box bounds, hard constraints
/// and the seed price vector.
pub struct PricingProblem {
    objective: RoyaltyObjective,
    bounds: Vec<(f64, f64)>,
    initial: Vec<f64>,
    hard: Vec<Constraint>,
}

impl PricingProblem {
    pub fn new(
        platforms: &[Platform],
        constraints: &ConstraintSet,
        config: &OptimizerConfig,
        initial_guess: Vec<f64>,
    ) -> Self {
        let margins: Vec<f64> = platforms.iter().map(|p| p.margin).collect();
        let bounds: Vec<(f64, f64)> = platforms.iter().map(|p| p.bounds).collect();

        let (objective, hard) = match config.mode {
            ObjectiveStrategy::HardConstraint => (
                RoyaltyObjective::hard_constraint(&margins),
                constraints.as_slice().to_vec(),
            ),
            ObjectiveStrategy::PenaltyAugmented => {
                let (hard, soft) = constraints.split_bounds();
                let reward_cap = config.comfortable_royalty_diff - config.min_royalty_diff;
                (
                    RoyaltyObjective::penalty_augmented(&margins, soft, config.penalty, reward_cap),
                    hard,
                )
            }
        };

        debug!(
            mode = config.mode.as_str(),
            params = platforms.len(),
            hard = hard.len(),
            soft = objective.soft_constraints().len(),
            "pricing problem assembled"
        );

        Self {
            objective,
            bounds,
            initial: initial_guess,
            hard,
        }
    }

    pub fn objective(&self) -> &RoyaltyObjective {
        &self.objective
    }
}

impl Problem for PricingProblem {
    fn cost(&self, params: &[f64]) -> f64 {
        self.objective.value(params)
    }

    fn gradient(&self, params: &[f64], grad: &mut [f64]) {
        self.objective.gradient(params, grad);
    }

    fn linear_cost(&self) -> Option<&[f64]> {
        self.objective.linear_coefficients()
    }

    fn num_params(&self) -> usize {
        self.bounds.len()
    }

    fn initial_params(&self) -> &[f64] {
        &self.initial
    }

    fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    fn constraints(&self) -> &[Constraint] {
        &self.hard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConstraintFamily, MarginGrouping};

    fn setup(mode: ObjectiveStrategy) -> PricingProblem {
        let platforms = vec![
            Platform::new("A", 0.8, 10.0, 30.0),
            Platform::new("B", 0.4, 10.0, 30.0),
            Platform::new("C", 0.4, 10.0, 30.0),
        ];
        let config = OptimizerConfig::default().with_mode(mode);
        let grouping = MarginGrouping::from_margins(&[0.8, 0.4, 0.4]);
        let constraints = ConstraintSet::build(&platforms, &grouping, &config);
        PricingProblem::new(&platforms, &constraints, &config, vec![28.0, 22.0, 21.0])
    }

    #[test]
    fn hard_mode_keeps_every_constraint() {
        let problem = setup(ObjectiveStrategy::HardConstraint);
        assert_eq!(problem.constraints().len(), 6 + 1 + 2);
        assert!(problem.linear_cost().is_some());
        assert_eq!(problem.num_params(), 3);
        assert_eq!(problem.initial_params(), &[28.0, 22.0, 21.0]);
    }

    #[test]
    fn penalty_mode_only_keeps_bounds_hard() {
        let problem = setup(ObjectiveStrategy::PenaltyAugmented);
        assert!(problem
            .constraints()
            .iter()
            .all(|c| c.family() == ConstraintFamily::Bound));
        assert_eq!(problem.objective().soft_constraints().len(), 3);
        assert!(problem.linear_cost().is_none());
    }
}
