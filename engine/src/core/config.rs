//! Aggregate configuration for a full assessment battery.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tasks::nback::NBackConfig;
use crate::tasks::sorting::SortingConfig;
use crate::tasks::stroop::StroopConfig;

use super::error::ConfigResult;

/// One section per task. Missing sections and fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    pub nback: NBackConfig,
    pub stroop: StroopConfig,
    pub sorting: SortingConfig,
}

impl AssessmentConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        debug!(?config, "assessment configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.nback.validate()?;
        self.stroop.validate()?;
        self.sorting.validate()
    }
}
