use super::types::{OptimizerConfig, Platform};
use crate::error::{InputError, Result};

/// Fail fast on malformed platforms.
pub fn validate_platforms(platforms: &[Platform]) -> Result<()> {
    if platforms.is_empty() {
        return Err(InputError::EmptyCatalog);
    }

    for (index, platform) in platforms.iter().enumerate() {
        let non_finite = |field| InputError::NonFinite {
            index,
            name: platform.name.clone(),
            field,
        };
        if !platform.margin.is_finite() {
            return Err(non_finite("margin"));
        }
        if !platform.bounds.0.is_finite() {
            return Err(non_finite("min price"));
        }
        if !platform.bounds.1.is_finite() {
            return Err(non_finite("max price"));
        }
        if platform.margin <= 0.0 || platform.margin > 1.0 {
            return Err(InputError::InvalidMargin {
                index,
                name: platform.name.clone(),
                margin: platform.margin,
            });
        }
        if platform.bounds.0 > platform.bounds.1 {
            return Err(InputError::InvalidBounds {
                index,
                name: platform.name.clone(),
                min_price: platform.bounds.0,
                max_price: platform.bounds.1,
            });
        }
    }

    Ok(())
}

/// Check option ranges and the optional seed against the catalog size.
pub fn validate_config(config: &OptimizerConfig, num_platforms: usize) -> Result<()> {
    let invalid = |field, reason: &str| InputError::InvalidConfig {
        field,
        reason: reason.to_string(),
    };

    if !config.min_royalty_diff.is_finite() || config.min_royalty_diff < 0.0 {
        return Err(invalid("min_royalty_diff", "must be finite and non-negative"));
    }
    if !config.max_spread.is_finite() || config.max_spread < 0.0 {
        return Err(invalid("max_spread", "must be finite and non-negative"));
    }
    if !(config.tolerance > 0.0) || !config.tolerance.is_finite() {
        return Err(invalid("tolerance", "must be positive"));
    }
    if !(config.constraint_tolerance > 0.0) || !config.constraint_tolerance.is_finite() {
        return Err(invalid("constraint_tolerance", "must be positive"));
    }
    if config.max_iterations == 0 {
        return Err(invalid("max_iterations", "must be at least 1"));
    }
    if !config.comfortable_royalty_diff.is_finite() {
        return Err(invalid("comfortable_royalty_diff", "must be finite"));
    }

    let penalty = &config.penalty;
    if !(penalty.penalty_weight > 0.0) || !penalty.penalty_weight.is_finite() {
        return Err(invalid("penalty.penalty_weight", "must be positive"));
    }
    if !(penalty.reward_weight >= 0.0) || !penalty.reward_weight.is_finite() {
        return Err(invalid("penalty.reward_weight", "must be non-negative"));
    }
    if !(penalty.smoothing > 0.0) || !penalty.smoothing.is_finite() {
        return Err(invalid("penalty.smoothing", "must be positive"));
    }

    if let Some(guess) = &config.initial_guess {
        if guess.len() != num_platforms {
            return Err(InputError::InitialGuessLength {
                expected: num_platforms,
                actual: guess.len(),
            });
        }
        if guess.iter().any(|p| !p.is_finite()) {
            return Err(invalid("initial_guess", "contains a non-finite price"));
        }
    }

    Ok(())
}
