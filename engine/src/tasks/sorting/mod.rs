//! Wisconsin-style card sorting with hidden rule switches.

pub mod engine;
pub mod metrics;

pub use engine::{
    correct_bin, BinIndex, Card, CardColor, CardShape, SortOutcome, SortParams, SortRule,
    SortingConfig, SortingEngine, SortingRules, SortingTrial, TargetBin, STANDARD_BINS,
};
pub use metrics::SortingMetrics;
