use crate::domain::{Constraint, ConstraintFamily, ObjectiveStrategy, PenaltyWeights};

/// Negated total royalty, optionally with smooth penalty/reward terms.
///
/// In penalty-augmented form each soft constraint `g(x) >= 0` contributes
/// `penalty_weight * softplus(-g)` and, for separation constraints, a bounded
/// reward `reward_weight * clamp(g, 0, reward_cap)` (both smoothed with width
/// `smoothing`). The reward cap is the headroom between the minimum and the
/// comfortable royalty gap.
#[derive(Clone, Debug)]
pub struct RoyaltyObjective {
    strategy: ObjectiveStrategy,
    /// -margin[i], the linear part
    coefficients: Vec<f64>,
    soft: Vec<Constraint>,
    weights: PenaltyWeights,
    reward_cap: f64,
}

impl RoyaltyObjective {
    pub fn hard_constraint(margins: &[f64]) -> Self {
        Self {
            strategy: ObjectiveStrategy::HardConstraint,
            coefficients: margins.iter().map(|m| -m).collect(),
            soft: Vec::new(),
            weights: PenaltyWeights::default(),
            reward_cap: 0.0,
        }
    }

    pub fn penalty_augmented(
        margins: &[f64],
        soft: Vec<Constraint>,
        weights: PenaltyWeights,
        reward_cap: f64,
    ) -> Self {
        Self {
            strategy: ObjectiveStrategy::PenaltyAugmented,
            coefficients: margins.iter().map(|m| -m).collect(),
            soft,
            weights,
            reward_cap: reward_cap.max(0.0),
        }
    }

    pub fn strategy(&self) -> ObjectiveStrategy {
        self.strategy
    }

    pub fn soft_constraints(&self) -> &[Constraint] {
        &self.soft
    }

    /// Coefficients of the cost when it is purely linear.
    pub fn linear_coefficients(&self) -> Option<&[f64]> {
        match self.strategy {
            ObjectiveStrategy::HardConstraint => Some(&self.coefficients),
            ObjectiveStrategy::PenaltyAugmented => None,
        }
    }

    pub fn total_royalty(&self, prices: &[f64]) -> f64 {
        -self
            .coefficients
            .iter()
            .zip(prices)
            .map(|(c, p)| c * p)
            .sum::<f64>()
    }

    pub fn value(&self, prices: &[f64]) -> f64 {
        let mut value = -self.total_royalty(prices);
        for constraint in &self.soft {
            let g = constraint.evaluate(prices);
            value += self.weights.penalty_weight * softplus(-g, self.weights.smoothing);
            if self.rewards(constraint) {
                value -= self.weights.reward_weight * self.smooth_clamp(g);
            }
        }
        value
    }

    pub fn gradient(&self, prices: &[f64], grad: &mut [f64]) {
        grad.copy_from_slice(&self.coefficients);
        let s = self.weights.smoothing;
        for constraint in &self.soft {
            let g = constraint.evaluate(prices);
            let mut d_dg = -self.weights.penalty_weight * sigmoid(-g / s);
            if self.rewards(constraint) {
                d_dg -= self.weights.reward_weight
                    * (sigmoid(g / s) - sigmoid((g - self.reward_cap) / s));
            }
            constraint.accumulate_gradient(d_dg, grad);
        }
    }

    fn rewards(&self, constraint: &Constraint) -> bool {
        self.reward_cap > 0.0
            && self.weights.reward_weight > 0.0
            && constraint.family() == ConstraintFamily::Separation
    }

    fn smooth_clamp(&self, g: f64) -> f64 {
        let s = self.weights.smoothing;
        softplus(g, s) - softplus(g - self.reward_cap, s)
    }
}

/// `s * ln(1 + exp(z / s))`, a smooth `max(z, 0)`.
#[inline]
pub fn softplus(z: f64, s: f64) -> f64 {
    z.max(0.0) + s * (-(z.abs() / s)).exp().ln_1p()
}

#[inline]
pub fn sigmoid(t: f64) -> f64 {
    if t >= 0.0 {
        1.0 / (1.0 + (-t).exp())
    } else {
        let e = t.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConstraintKind;

    fn separation() -> Constraint {
        Constraint::new(ConstraintKind::Separation {
            higher: 0,
            lower: 1,
            higher_margin: 0.8,
            lower_margin: 0.4,
            min_royalty_diff: 0.5,
        })
    }

    fn spread() -> Constraint {
        Constraint::new(ConstraintKind::Spread {
            first: 0,
            second: 1,
            max_spread: 5.0,
        })
    }

    #[test]
    fn hard_form_is_negated_royalty() {
        let objective = RoyaltyObjective::hard_constraint(&[0.8, 0.4]);
        assert!((objective.value(&[30.0, 20.0]) + 32.0).abs() < 1e-12);
        assert!((objective.total_royalty(&[30.0, 20.0]) - 32.0).abs() < 1e-12);
        assert_eq!(objective.linear_coefficients(), Some(&[-0.8, -0.4][..]));

        let mut grad = [0.0; 2];
        objective.gradient(&[1.0, 1.0], &mut grad);
        assert_eq!(grad, [-0.8, -0.4]);
    }

    #[test]
    fn penalty_grows_linearly_once_gap_is_short() {
        let weights = PenaltyWeights::default();
        let objective = RoyaltyObjective::penalty_augmented(&[0.8, 0.4], vec![separation()], weights, 0.5);
        assert!(objective.linear_coefficients().is_none());

        // g = 0.8 * 10 - 0.4 * 30 - 0.5 = -4.5, far into the linear regime
        let prices = [10.0, 30.0];
        let base = -(0.8 * 10.0 + 0.4 * 30.0);
        let expected = base + weights.penalty_weight * 4.5;
        assert!((objective.value(&prices) - expected).abs() < 1e-6);
    }

    #[test]
    fn reward_is_bounded_by_the_cap() {
        let weights = PenaltyWeights::default();
        let objective = RoyaltyObjective::penalty_augmented(&[0.8, 0.4], vec![separation()], weights, 0.5);

        // g = 24 - 4 - 0.5 = 19.5: no penalty, full reward
        let prices = [30.0, 10.0];
        let base = -(0.8 * 30.0 + 0.4 * 10.0);
        let expected = base - weights.reward_weight * 0.5;
        assert!((objective.value(&prices) - expected).abs() < 1e-6);
    }

    #[test]
    fn spread_terms_are_never_rewarded() {
        let weights = PenaltyWeights::default();
        let objective = RoyaltyObjective::penalty_augmented(&[0.7, 0.7], vec![spread()], weights, 0.5);
        let prices = [20.0, 20.0];
        assert!((objective.value(&prices) + 28.0).abs() < 1e-6);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let weights = PenaltyWeights::default();
        let objective = RoyaltyObjective::penalty_augmented(
            &[0.8, 0.4],
            vec![separation(), spread()],
            weights,
            0.5,
        );
        let h = 1e-6;
        for prices in [[20.0, 38.0], [25.6, 49.5], [12.0, 10.0]] {
            let mut grad = [0.0; 2];
            objective.gradient(&prices, &mut grad);
            for i in 0..2 {
                let mut plus = prices;
                let mut minus = prices;
                plus[i] += h;
                minus[i] -= h;
                let numeric = (objective.value(&plus) - objective.value(&minus)) / (2.0 * h);
                assert!((numeric - grad[i]).abs() < 1e-4, "{i}: {numeric} vs {}", grad[i]);
            }
        }
    }

    #[test]
    fn softplus_is_stable_at_extremes() {
        assert_eq!(softplus(1e6, 0.01), 1e6);
        assert_eq!(softplus(-1e6, 0.01), 0.0);
        assert!((softplus(0.0, 0.01) - 0.01 * 2f64.ln()).abs() < 1e-15);
        assert_eq!(sigmoid(-1e6), 0.0);
        assert_eq!(sigmoid(1e6), 1.0);
    }
}
