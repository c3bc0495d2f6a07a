pub mod nback;
pub mod session;
pub mod sorting;
pub mod stroop;

pub use session::{AdvanceOutcome, Phase, Signal, TaskRules, TaskTrial, TrialRecord, TrialRunner, Verdict};
