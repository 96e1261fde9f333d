pub mod constraints;
pub mod grouping;
pub mod initial_guess;
pub mod types;
pub mod validation;

pub use constraints::{Constraint, ConstraintFamily, ConstraintKind, ConstraintSet, ConstraintViolation};
pub use grouping::MarginGrouping;
pub use initial_guess::synthesize_initial_guess;
pub use types::*;
pub use validation::{validate_config, validate_platforms};
