use serde::{Deserialize, Serialize};

// ===== ENUMS =====

/// How the ordering and spread rules reach the solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStrategy {
    /// Separation and spread are hard inequality constraints.
    #[default]
    HardConstraint,
    /// Separation and spread become smooth penalty/reward terms; only bounds stay hard.
    PenaltyAugmented,
}

impl ObjectiveStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HardConstraint => "hard_constraint",
            Self::PenaltyAugmented => "penalty_augmented",
        }
    }
}

// ===== CORE DATA TYPES =====

/// A distribution platform: name, retained revenue fraction and allowed price range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
    pub margin: f64,
    /// (min_price, max_price)
    pub bounds: (f64, f64),
}

impl Platform {
    pub fn new(name: impl Into<String>, margin: f64, min_price: f64, max_price: f64) -> Self {
        Self {
            name: name.into(),
            margin,
            bounds: (min_price, max_price),
        }
    }

    pub fn min_price(&self) -> f64 {
        self.bounds.0
    }

    pub fn max_price(&self) -> f64 {
        self.bounds.1
    }

    pub fn royalty(&self, price: f64) -> f64 {
        self.margin * price
    }

    pub fn is_within_bounds(&self, price: f64, tolerance: f64) -> bool {
        price >= self.bounds.0 - tolerance && price <= self.bounds.1 + tolerance
    }
}

/// Weights for the penalty-augmented objective.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyWeights {
    /// Slope of the penalty once a rule is violated.
    pub penalty_weight: f64,
    /// Weight of the bounded reward for separation above the minimum gap.
    pub reward_weight: f64,
    /// Width of the softplus smoothing around each hinge.
    pub smoothing: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            penalty_weight: 20.0,
            reward_weight: 0.3,
            smoothing: 0.01,
        }
    }
}

/// Options recognised by the pricing engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub min_royalty_diff: f64,
    pub max_spread: f64,
    pub mode: ObjectiveStrategy,
    pub penalty: PenaltyWeights,
    pub tolerance: f64,
    pub constraint_tolerance: f64,
    pub max_iterations: u32,
    pub verbose: bool,
    /// Separations below this (but still positive) produce a `NarrowSeparation` warning.
    pub comfortable_royalty_diff: f64,
    pub initial_guess: Option<Vec<f64>>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_royalty_diff: 0.5,
            max_spread: 5.0,
            mode: ObjectiveStrategy::HardConstraint,
            penalty: PenaltyWeights::default(),
            tolerance: 1e-6,
            constraint_tolerance: 1e-6,
            max_iterations: 1000,
            verbose: false,
            comfortable_royalty_diff: 1.0,
            initial_guess: None,
        }
    }
}

impl OptimizerConfig {
    pub fn with_min_royalty_diff(mut self, min_royalty_diff: f64) -> Self {
        self.min_royalty_diff = min_royalty_diff;
        self
    }

    pub fn with_max_spread(mut self, max_spread: f64) -> Self {
        self.max_spread = max_spread;
        self
    }

    pub fn with_mode(mut self, mode: ObjectiveStrategy) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_penalty(mut self, penalty: PenaltyWeights) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_constraint_tolerance(mut self, constraint_tolerance: f64) -> Self {
        self.constraint_tolerance = constraint_tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_comfortable_royalty_diff(mut self, threshold: f64) -> Self {
        self.comfortable_royalty_diff = threshold;
        self
    }

    pub fn with_initial_guess(mut self, initial_guess: Vec<f64>) -> Self {
        self.initial_guess = Some(initial_guess);
        self
    }
}

// ===== OUTPUT TYPES =====

/// Non-fatal observation attached to a solution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NumericWarning {
    /// Tier separation holds but sits under the comfortable threshold.
    NarrowSeparation {
        higher_margin: f64,
        lower_margin: f64,
        gap: f64,
        threshold: f64,
    },
}

/// One row of the presentation view, rounded to cents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// Registry index of the platform.
    pub index: usize,
    pub name: String,
    pub margin: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub price: f64,
    pub royalty: f64,
    /// 1-based, by descending royalty.
    pub rank: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveStats {
    pub solver: String,
    pub iterations: u32,
    pub cost_evals: usize,
    pub grad_evals: usize,
    pub max_violation: f64,
}

/// Outcome of one optimisation run.
///
/// `prices`, `royalties` and `ranking` are indexed like the input registry and
/// are empty when the run is infeasible.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub prices: Vec<f64>,
    pub royalties: Vec<f64>,
    pub ranking: Vec<usize>,
    /// Sorted by descending royalty.
    pub entries: Vec<RankedEntry>,
    pub total_royalty: f64,
    pub feasible: bool,
    pub diagnostic: Option<String>,
    pub warnings: Vec<NumericWarning>,
    pub stats: SolveStats,
}

impl Solution {
    pub fn infeasible(diagnostic: impl Into<String>, stats: SolveStats) -> Self {
        Self {
            feasible: false,
            diagnostic: Some(diagnostic.into()),
            stats,
            ..Self::default()
        }
    }

    pub fn entry(&self, name: &str) -> Option<&RankedEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Round to two decimals for display.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
