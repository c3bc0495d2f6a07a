//! Construction-time errors. Running engines never fail; see the signal
//! guards in [`crate::tasks::session`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be a probability in [0, 1], got {value}")]
    Probability { field: &'static str, value: f64 },

    #[error("{field} must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: f64,
        value: f64,
    },

    #[error("{field}: {reason}")]
    Inconsistent { field: &'static str, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub fn inconsistent(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Inconsistent {
            field,
            reason: reason.into(),
        }
    }
}

pub(crate) fn check_probability(field: &'static str, value: f64) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability { field, value })
    }
}

pub(crate) fn check_at_least(field: &'static str, value: f64, min: f64) -> ConfigResult<()> {
    // NaN fails the comparison and lands in the error branch.
    if value >= min {
        Ok(())
    } else {
        Err(ConfigError::TooSmall { field, min, value })
    }
}
