//! Adaptive N-back working-memory task.

pub mod engine;
pub mod metrics;

pub use engine::{
    Color, NBackAction, NBackConfig, NBackEngine, NBackItem, NBackOutcome, NBackParams,
    NBackRules, NBackTrial, Shape,
};
pub use metrics::NBackMetrics;
