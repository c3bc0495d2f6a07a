//! Go/No-Go colour-word Stroop task with speed adaptation.

pub mod engine;
pub mod metrics;

pub use engine::{
    GoNoGoOutcome, InkColor, StroopAction, StroopConfig, StroopEngine, StroopItem, StroopParams,
    StroopRules, StroopTrial, Word,
};
pub use metrics::StroopMetrics;
