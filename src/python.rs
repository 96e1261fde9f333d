use crate::domain::{ObjectiveStrategy, OptimizerConfig, Platform, Solution};
use crate::optimizer::PricingOptimizer;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

// ===== ENUMS =====

#[pyclass(eq, eq_int, name = "ObjectiveStrategy")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PyObjectiveStrategy {
    HardConstraint,
    PenaltyAugmented,
}

#[pymethods]
impl PyObjectiveStrategy {
    fn __repr__(&self) -> &str {
        match self {
            Self::HardConstraint => "ObjectiveStrategy.HardConstraint",
            Self::PenaltyAugmented => "ObjectiveStrategy.PenaltyAugmented",
        }
    }
}

impl From<PyObjectiveStrategy> for ObjectiveStrategy {
    fn from(strategy: PyObjectiveStrategy) -> Self {
        match strategy {
            PyObjectiveStrategy::HardConstraint => Self::HardConstraint,
            PyObjectiveStrategy::PenaltyAugmented => Self::PenaltyAugmented,
        }
    }
}

// ===== INPUT =====

#[pyclass(name = "Platform")]
#[derive(Clone, Debug)]
pub struct PyPlatform {
    #[pyo3(get, set)]
    pub name: String,
    #[pyo3(get, set)]
    pub margin: f64,
    #[pyo3(get, set)]
    pub min_price: f64,
    #[pyo3(get, set)]
    pub max_price: f64,
}

#[pymethods]
impl PyPlatform {
    #[new]
    fn new(name: String, margin: f64, min_price: f64, max_price: f64) -> Self {
        Self {
            name,
            margin,
            min_price,
            max_price,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Platform(name={:?}, margin={}, bounds=({}, {}))",
            self.name, self.margin, self.min_price, self.max_price
        )
    }
}

impl From<&PyPlatform> for Platform {
    fn from(p: &PyPlatform) -> Self {
        Platform::new(p.name.clone(), p.margin, p.min_price, p.max_price)
    }
}

// ===== OUTPUT =====

#[pyclass(name = "PricingResult")]
#[derive(Clone, Debug)]
pub struct PyPricingResult {
    #[pyo3(get)]
    pub feasible: bool,
    #[pyo3(get)]
    pub diagnostic: Option<String>,
    #[pyo3(get)]
    pub prices: Vec<f64>,
    #[pyo3(get)]
    pub royalties: Vec<f64>,
    #[pyo3(get)]
    pub ranking: Vec<usize>,
    #[pyo3(get)]
    pub total_royalty: f64,
    #[pyo3(get)]
    pub iterations: u32,
    solution: Solution,
}

#[pymethods]
impl PyPricingResult {
    /// Full solution, including ranked entries and warnings, as JSON.
    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.solution).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!(
            "PricingResult(feasible={}, total_royalty={:.2})",
            self.feasible, self.total_royalty
        )
    }
}

impl From<Solution> for PyPricingResult {
    fn from(solution: Solution) -> Self {
        Self {
            feasible: solution.feasible,
            diagnostic: solution.diagnostic.clone(),
            prices: solution.prices.clone(),
            royalties: solution.royalties.clone(),
            ranking: solution.ranking.clone(),
            total_royalty: solution.total_royalty,
            iterations: solution.stats.iterations,
            solution,
        }
    }
}

// ===== OPTIMIZER =====

#[pyclass(name = "Optimizer")]
pub struct PyOptimizer {
    #[pyo3(get, set)]
    pub min_royalty_diff: f64,
    #[pyo3(get, set)]
    pub max_spread: f64,
    #[pyo3(get, set)]
    pub mode: PyObjectiveStrategy,
    #[pyo3(get, set)]
    pub tolerance: f64,
    #[pyo3(get, set)]
    pub max_iterations: u32,
    #[pyo3(get, set)]
    pub verbose: bool,
}

impl PyOptimizer {
    fn engine(&self) -> PricingOptimizer {
        PricingOptimizer::new(
            OptimizerConfig::default()
                .with_min_royalty_diff(self.min_royalty_diff)
                .with_max_spread(self.max_spread)
                .with_mode(self.mode.into())
                .with_tolerance(self.tolerance)
                .with_max_iterations(self.max_iterations)
                .with_verbose(self.verbose),
        )
    }
}

fn native(platforms: &[PyPlatform]) -> Vec<Platform> {
    platforms.iter().map(Platform::from).collect()
}

#[pymethods]
impl PyOptimizer {
    #[new]
    #[pyo3(signature = (min_royalty_diff=0.5, max_spread=5.0, mode=PyObjectiveStrategy::HardConstraint, tolerance=1e-6, max_iterations=1000, verbose=false))]
    fn new(
        min_royalty_diff: f64,
        max_spread: f64,
        mode: PyObjectiveStrategy,
        tolerance: f64,
        max_iterations: u32,
        verbose: bool,
    ) -> Self {
        Self {
            min_royalty_diff,
            max_spread,
            mode,
            tolerance,
            max_iterations,
            verbose,
        }
    }

    fn optimize(&self, platforms: Vec<PyPlatform>, py: Python<'_>) -> PyResult<PyPricingResult> {
        let engine = self.engine();
        let platforms = native(&platforms);
        py.allow_threads(|| engine.optimize(&platforms))
            .map(PyPricingResult::from)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn greedy_baseline(&self, platforms: Vec<PyPlatform>) -> PyResult<PyPricingResult> {
        self.engine()
            .greedy_baseline(&native(&platforms))
            .map(PyPricingResult::from)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Descriptions of the constraints broken by the starting prices.
    fn violations_at_initial_guess(&self, platforms: Vec<PyPlatform>) -> PyResult<Vec<String>> {
        let violations = self
            .engine()
            .violations_at_initial_guess(&native(&platforms))
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(violations.into_iter().map(|v| v.description).collect())
    }
}

#[pymodule]
fn royaltyoptimizer(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyObjectiveStrategy>()?;
    m.add_class::<PyPlatform>()?;
    m.add_class::<PyOptimizer>()?;
    m.add_class::<PyPricingResult>()?;
    Ok(())
}
