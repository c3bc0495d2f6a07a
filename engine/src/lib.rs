//! Neuroloop assessment engine: adaptive N-back, Go/No-Go Stroop and card
//! sorting tasks, each driven through the shared trial state machine in
//! [`tasks::session`]. The crate holds no timers and does no I/O; callers
//! deliver signals with timestamps and persist the resulting summaries.

pub mod core;
pub mod tasks;

pub use crate::core::config::AssessmentConfig;
pub use crate::core::error::{ConfigError, ConfigResult};
pub use crate::core::summary::SummaryRecord;
pub use crate::core::timing::{Clock, InstantStamp, ManualClock, MonotonicClock};
pub use tasks::nback::{NBackEngine, NBackMetrics};
pub use tasks::sorting::{SortingEngine, SortingMetrics};
pub use tasks::stroop::{StroopEngine, StroopMetrics};
pub use tasks::{AdvanceOutcome, Phase, Signal};
