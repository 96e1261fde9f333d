use thiserror::Error;

/// Rejected input; raised before any constraint is built.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("platform list is empty")]
    EmptyCatalog,

    #[error("platform {index} ('{name}') has min price {min_price} above max price {max_price}")]
    InvalidBounds {
        index: usize,
        name: String,
        min_price: f64,
        max_price: f64,
    },

    #[error("platform {index} ('{name}') has margin {margin} outside (0, 1]")]
    InvalidMargin {
        index: usize,
        name: String,
        margin: f64,
    },

    #[error("platform {index} ('{name}') has a non-finite {field}")]
    NonFinite {
        index: usize,
        name: String,
        field: &'static str,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("initial guess has {actual} prices but there are {expected} platforms")]
    InitialGuessLength { expected: usize, actual: usize },
}

/// Errors reading a catalog or configuration file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] InputError),
}

pub type Result<T, E = InputError> = std::result::Result<T, E>;
