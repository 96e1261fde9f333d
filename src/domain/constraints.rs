use super::grouping::MarginGrouping;
use super::types::{OptimizerConfig, Platform};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Constraint operands and constants, bound at construction.
///
/// Every variant is satisfied when [`Constraint::evaluate`] is `>= 0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintKind {
    /// `price[index] - min_price >= 0`
    LowerBound { index: usize, min_price: f64 },
    /// `max_price - price[index] >= 0`
    UpperBound { index: usize, max_price: f64 },
    /// `higher_margin * price[higher] - lower_margin * price[lower] - min_royalty_diff >= 0`
    Separation {
        higher: usize,
        lower: usize,
        higher_margin: f64,
        lower_margin: f64,
        min_royalty_diff: f64,
    },
    /// `max_spread - (price[first] - price[second]) >= 0`
    Spread {
        first: usize,
        second: usize,
        max_spread: f64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintFamily {
    Bound,
    Separation,
    Spread,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
}

impl Constraint {
    pub fn new(kind: ConstraintKind) -> Self {
        Self { kind }
    }

    pub fn family(&self) -> ConstraintFamily {
        match self.kind {
            ConstraintKind::LowerBound { .. } | ConstraintKind::UpperBound { .. } => {
                ConstraintFamily::Bound
            }
            ConstraintKind::Separation { .. } => ConstraintFamily::Separation,
            ConstraintKind::Spread { .. } => ConstraintFamily::Spread,
        }
    }

    #[inline]
    pub fn evaluate(&self, prices: &[f64]) -> f64 {
        match self.kind {
            ConstraintKind::LowerBound { index, min_price } => prices[index] - min_price,
            ConstraintKind::UpperBound { index, max_price } => max_price - prices[index],
            ConstraintKind::Separation {
                higher,
                lower,
                higher_margin,
                lower_margin,
                min_royalty_diff,
            } => higher_margin * prices[higher] - lower_margin * prices[lower] - min_royalty_diff,
            ConstraintKind::Spread {
                first,
                second,
                max_spread,
            } => max_spread - (prices[first] - prices[second]),
        }
    }

    /// Adds `weight * grad(g)` into `grad`.
    #[inline]
    pub fn accumulate_gradient(&self, weight: f64, grad: &mut [f64]) {
        match self.kind {
            ConstraintKind::LowerBound { index, .. } => grad[index] += weight,
            ConstraintKind::UpperBound { index, .. } => grad[index] -= weight,
            ConstraintKind::Separation {
                higher,
                lower,
                higher_margin,
                lower_margin,
                ..
            } => {
                grad[higher] += weight * higher_margin;
                grad[lower] -= weight * lower_margin;
            }
            ConstraintKind::Spread { first, second, .. } => {
                grad[first] -= weight;
                grad[second] += weight;
            }
        }
    }

    /// Linear form `g(x) = sum(coef * x[index]) + offset`.
    pub fn linear_terms(&self) -> (Vec<(usize, f64)>, f64) {
        match self.kind {
            ConstraintKind::LowerBound { index, min_price } => (vec![(index, 1.0)], -min_price),
            ConstraintKind::UpperBound { index, max_price } => (vec![(index, -1.0)], max_price),
            ConstraintKind::Separation {
                higher,
                lower,
                higher_margin,
                lower_margin,
                min_royalty_diff,
            } => (
                vec![(higher, higher_margin), (lower, -lower_margin)],
                -min_royalty_diff,
            ),
            ConstraintKind::Spread {
                first,
                second,
                max_spread,
            } => (vec![(first, -1.0), (second, 1.0)], max_spread),
        }
    }

    pub fn describe(&self, platforms: &[Platform]) -> String {
        let name = |i: usize| platforms.get(i).map(|p| p.name.as_str()).unwrap_or("?");
        match self.kind {
            ConstraintKind::LowerBound { index, min_price } => {
                format!("price of '{}' >= {}", name(index), min_price)
            }
            ConstraintKind::UpperBound { index, max_price } => {
                format!("price of '{}' <= {}", name(index), max_price)
            }
            ConstraintKind::Separation {
                higher,
                lower,
                higher_margin,
                lower_margin,
                min_royalty_diff,
            } => format!(
                "royalty of '{}' (margin {}) exceeds royalty of '{}' (margin {}) by >= {}",
                name(higher),
                higher_margin,
                name(lower),
                lower_margin,
                min_royalty_diff
            ),
            ConstraintKind::Spread {
                first,
                second,
                max_spread,
            } => format!(
                "price of '{}' exceeds price of '{}' by <= {}",
                name(first),
                name(second),
                max_spread
            ),
        }
    }
}

/// A constraint that does not hold at some price vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub constraint: Constraint,
    /// Negative constraint value.
    pub value: f64,
    pub description: String,
}

/// All constraints for one run, in family order: bounds, separation, spread.
#[derive(Clone, Debug, Default)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn build(
        platforms: &[Platform],
        grouping: &MarginGrouping,
        config: &OptimizerConfig,
    ) -> Self {
        let mut constraints = Vec::with_capacity(platforms.len() * 2 + grouping.num_tiers());

        for (index, platform) in platforms.iter().enumerate() {
            constraints.push(Constraint::new(ConstraintKind::LowerBound {
                index,
                min_price: platform.min_price(),
            }));
            constraints.push(Constraint::new(ConstraintKind::UpperBound {
                index,
                max_price: platform.max_price(),
            }));
        }

        // One representative per tier keeps separation linear in the tier count
        for (higher_margin, lower_margin) in grouping.adjacent_tiers() {
            let (Some(higher), Some(lower)) = (
                grouping.representative(higher_margin),
                grouping.representative(lower_margin),
            ) else {
                warn!(higher_margin, lower_margin, "margin tier without representative, skipping");
                continue;
            };
            constraints.push(Constraint::new(ConstraintKind::Separation {
                higher,
                lower,
                higher_margin,
                lower_margin,
                min_royalty_diff: config.min_royalty_diff,
            }));
        }

        for (_, members) in grouping.tiers() {
            if members.len() < 2 {
                continue;
            }
            for (a, &i) in members.iter().enumerate() {
                for &j in &members[a + 1..] {
                    constraints.push(Constraint::new(ConstraintKind::Spread {
                        first: i,
                        second: j,
                        max_spread: config.max_spread,
                    }));
                    constraints.push(Constraint::new(ConstraintKind::Spread {
                        first: j,
                        second: i,
                        max_spread: config.max_spread,
                    }));
                }
            }
        }

        let set = Self { constraints };
        debug!(
            bounds = set.count(ConstraintFamily::Bound),
            separation = set.count(ConstraintFamily::Separation),
            spread = set.count(ConstraintFamily::Spread),
            "constraints built"
        );
        set
    }

    pub fn as_slice(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn count(&self, family: ConstraintFamily) -> usize {
        self.constraints.iter().filter(|c| c.family() == family).count()
    }

    pub fn of_family(&self, family: ConstraintFamily) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(move |c| c.family() == family)
    }

    /// Split into (hard, soft) for the penalty-augmented formulation.
    pub fn split_bounds(&self) -> (Vec<Constraint>, Vec<Constraint>) {
        self.constraints
            .iter()
            .partition(|c| c.family() == ConstraintFamily::Bound)
    }

    /// Largest amount by which any constraint is violated, 0 when all hold.
    pub fn max_violation(&self, prices: &[f64]) -> f64 {
        max_violation(&self.constraints, prices)
    }

    pub fn violations(
        &self,
        prices: &[f64],
        tolerance: f64,
        platforms: &[Platform],
    ) -> Vec<ConstraintViolation> {
        self.constraints
            .iter()
            .filter_map(|c| {
                let value = c.evaluate(prices);
                (value < -tolerance).then(|| ConstraintViolation {
                    constraint: *c,
                    value,
                    description: c.describe(platforms),
                })
            })
            .collect()
    }
}

pub fn max_violation(constraints: &[Constraint], prices: &[f64]) -> f64 {
    constraints
        .iter()
        .map(|c| -c.evaluate(prices))
        .fold(0.0, f64::max)
}
