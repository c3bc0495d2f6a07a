//! N-back working-memory task: shape/colour stream, adaptive N.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{check_at_least, check_probability, ConfigError, ConfigResult};
use crate::tasks::session::{Signal, TaskRules, TaskTrial, TrialRunner, Verdict};

use super::metrics::NBackMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Diamond,
}

impl Shape {
    pub const ALL: [Shape; 4] = [Shape::Circle, Shape::Square, Shape::Triangle, Shape::Diamond];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NBackItem {
    pub id: u64,
    pub shape: Shape,
    pub color: Color,
    /// True when shape and colour equal the item N positions back.
    pub is_target: bool,
}

impl NBackItem {
    pub fn same_features(&self, other: &NBackItem) -> bool {
        self.shape == other.shape && self.color == other.color
    }
}

/// The participant's only explicit response: "this matches".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NBackAction {
    Match,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NBackOutcome {
    Hit,
    Miss,
    FalseAlarm,
    CorrectRejection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NBackParams {
    pub n_level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NBackConfig {
    pub trial_budget: usize,
    pub start_level: u8,
    /// Ceiling for N; the generator keeps `max_level + 1` items of history.
    pub max_level: u8,
    pub streak_to_level_up: u32,
    pub target_probability: f64,
    /// Draws allowed when trying to avoid an accidental N-back match.
    pub max_resample_attempts: u32,
}

impl Default for NBackConfig {
    fn default() -> Self {
        Self {
            trial_budget: 30,
            start_level: 1,
            max_level: 3,
            streak_to_level_up: 5,
            target_probability: 0.35,
            max_resample_attempts: 10,
        }
    }
}

impl NBackConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_at_least("nback.trial_budget", self.trial_budget as f64, 1.0)?;
        check_at_least("nback.start_level", f64::from(self.start_level), 1.0)?;
        check_at_least("nback.streak_to_level_up", f64::from(self.streak_to_level_up), 1.0)?;
        check_at_least(
            "nback.max_resample_attempts",
            f64::from(self.max_resample_attempts),
            1.0,
        )?;
        check_probability("nback.target_probability", self.target_probability)?;
        if self.max_level < self.start_level {
            return Err(ConfigError::inconsistent(
                "nback.max_level",
                format!(
                    "ceiling {} is below the starting level {}",
                    self.max_level, self.start_level
                ),
            ));
        }
        Ok(())
    }
}

/// Generator, classifier and adaptive controller for the N-back task.
#[derive(Debug, Clone)]
pub struct NBackRules {
    config: NBackConfig,
    n_level: u8,
    max_n_level: u8,
    streak: u32,
}

pub type NBackEngine = TrialRunner<NBackRules>;
pub type NBackTrial = TaskTrial<NBackRules>;

impl NBackRules {
    pub fn new(config: NBackConfig) -> ConfigResult<Self> {
        config.validate()?;
        let level = config.start_level;
        Ok(Self {
            config,
            n_level: level,
            max_n_level: level,
            streak: 0,
        })
    }

    pub fn config(&self) -> &NBackConfig {
        &self.config
    }

    pub fn n_level(&self) -> u8 {
        self.n_level
    }

    pub fn max_n_level(&self) -> u8 {
        self.max_n_level
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }
}

impl TaskRules for NBackRules {
    type Stimulus = NBackItem;
    type Action = NBackAction;
    type Category = NBackOutcome;
    type Params = NBackParams;
    type Metrics = NBackMetrics;

    const TASK_ID: &'static str = "nback";

    fn trial_budget(&self) -> usize {
        self.config.trial_budget
    }

    fn history_depth(&self) -> usize {
        usize::from(self.config.max_level) + 1
    }

    fn restart(&mut self, _rng: &mut StdRng) {
        self.n_level = self.config.start_level;
        self.max_n_level = self.config.start_level;
        self.streak = 0;
    }

    fn params(&self) -> NBackParams {
        NBackParams {
            n_level: self.n_level,
        }
    }

    fn generate(&self, id: u64, history: &VecDeque<NBackItem>, rng: &mut StdRng) -> NBackItem {
        generate_item(id, history, self.n_level, &self.config, rng)
    }

    fn classify(&self, item: &NBackItem, signal: &Signal<NBackAction>) -> Verdict<NBackOutcome> {
        classify_response(item, signal)
    }

    fn adapt(&mut self, verdict: &Verdict<NBackOutcome>, _rng: &mut StdRng) -> Option<NBackParams> {
        if !verdict.correct {
            self.streak = 0;
            return None;
        }

        self.streak = self.streak.saturating_add(1);
        if self.streak >= self.config.streak_to_level_up && self.n_level < self.config.max_level {
            self.n_level += 1;
            self.max_n_level = self.max_n_level.max(self.n_level);
            self.streak = 0;
            debug!(n_level = self.n_level, "n-back level up");
            return Some(self.params());
        }
        None
    }

    fn reduce(&self, trials: &[NBackTrial]) -> NBackMetrics {
        NBackMetrics::from_trials(trials, self.config.max_level)
    }
}

/// The item `n` positions back, once the history is deep enough.
pub fn n_back_item(history: &VecDeque<NBackItem>, n: u8) -> Option<&NBackItem> {
    let n = usize::from(n);
    if n == 0 || history.len() < n {
        return None;
    }
    history.get(history.len() - n)
}

/// Draw the next item. With `target_probability` (once the history reaches
/// `n`) the N-back item's features are copied; otherwise the draw is repeated
/// a bounded number of times to avoid an accidental match, keeping the last
/// draw if every attempt collides.
pub fn generate_item(
    id: u64,
    history: &VecDeque<NBackItem>,
    n: u8,
    config: &NBackConfig,
    rng: &mut StdRng,
) -> NBackItem {
    let reference = n_back_item(history, n);

    let manufactured = match reference {
        Some(target) if rng.gen_bool(config.target_probability) => Some((target.shape, target.color)),
        _ => None,
    };

    let (shape, color) = match manufactured {
        Some(features) => features,
        None => {
            let mut drawn = draw_features(rng);
            let mut attempts = 1;
            while attempts < config.max_resample_attempts
                && reference.is_some_and(|r| r.shape == drawn.0 && r.color == drawn.1)
            {
                drawn = draw_features(rng);
                attempts += 1;
            }
            drawn
        }
    };

    NBackItem {
        id,
        shape,
        color,
        is_target: reference.is_some_and(|r| r.shape == shape && r.color == color),
    }
}

fn draw_features(rng: &mut StdRng) -> (Shape, Color) {
    let shape = *Shape::ALL.choose(rng).unwrap_or(&Shape::Circle);
    let color = *Color::ALL.choose(rng).unwrap_or(&Color::Red);
    (shape, color)
}

pub fn classify_response(item: &NBackItem, signal: &Signal<NBackAction>) -> Verdict<NBackOutcome> {
    let (correct, category) = match (signal.is_act(), item.is_target) {
        (true, true) => (true, NBackOutcome::Hit),
        (true, false) => (false, NBackOutcome::FalseAlarm),
        (false, true) => (false, NBackOutcome::Miss),
        (false, false) => (true, NBackOutcome::CorrectRejection),
    };
    Verdict { correct, category }
}

impl TrialRunner<NBackRules> {
    pub fn with_config(config: NBackConfig, seed: u64) -> ConfigResult<Self> {
        Ok(Self::new(NBackRules::new(config)?, seed))
    }

    pub fn n_level(&self) -> u8 {
        self.rules().n_level()
    }

    pub fn max_n_level(&self) -> u8 {
        self.rules().max_n_level()
    }

    pub fn streak(&self) -> u32 {
        self.rules().streak()
    }

    /// The item the current stimulus must be compared against.
    pub fn n_back_item(&self) -> Option<&NBackItem> {
        n_back_item(self.history(), self.n_level())
    }
}
