pub mod catalog;
pub mod domain;
pub mod error;
pub mod heuristic;
pub mod logging;
pub mod optimization;
pub mod optimizer;
pub mod report;

#[cfg(feature = "python")]
mod python;

pub use catalog::{demo_catalog, load_catalog, load_config, parse_catalog};
pub use domain::*;
pub use error::{InputError, LoadError};
pub use heuristic::greedy_separation;
pub use optimization::{FnCallback, NoopCallback, OptimizationCallback};
pub use optimizer::{PreparedRun, PricingOptimizer};
