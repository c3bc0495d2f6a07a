//! Go/No-Go Stroop task: respond to the ink colour, never to the word.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{check_at_least, check_probability, ConfigError, ConfigResult};
use crate::tasks::session::{Signal, TaskRules, TaskTrial, TrialRunner, Verdict};

use super::metrics::StroopMetrics;

const SPEED_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Word {
    Go,
    Stop,
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InkColor {
    Green,
    Red,
    Yellow,
}

/// Words and the ink colours they name, index-aligned.
const WORDS: [Word; 3] = [Word::Go, Word::Stop, Word::Wait];
const INKS: [InkColor; 3] = [InkColor::Green, InkColor::Red, InkColor::Yellow];

impl Word {
    /// The ink colour this word names.
    pub fn meaning(self) -> InkColor {
        match self {
            Word::Go => InkColor::Green,
            Word::Stop => InkColor::Red,
            Word::Wait => InkColor::Yellow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StroopItem {
    pub id: u64,
    pub word: Word,
    pub color: InkColor,
    /// Green ink means "respond", whatever the word says.
    pub should_respond: bool,
    pub is_congruent: bool,
}

impl StroopItem {
    pub fn new(id: u64, word: Word, color: InkColor) -> Self {
        Self {
            id,
            word,
            color,
            should_respond: color == InkColor::Green,
            is_congruent: word.meaning() == color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StroopAction {
    Tap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoNoGoOutcome {
    /// Tapped on green.
    Hit,
    /// Held back on a no-go colour.
    CorrectInhibition,
    /// Tapped on a no-go colour.
    ImpulseError,
    /// Held back on green.
    OmissionError,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StroopParams {
    pub speed_multiplier: f64,
    pub display_time_ms: u32,
    pub overdrive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StroopConfig {
    pub trial_budget: usize,
    pub congruent_probability: f64,
    pub streak_for_speedup: u32,
    pub speed_step: f64,
    pub max_speed: f64,
    pub overdrive_threshold: f64,
    pub initial_display_ms: u32,
    pub min_display_ms: u32,
    /// Display time removed per 1.0 of speed multiplier above 1.
    pub display_ms_per_speed: u32,
}

impl Default for StroopConfig {
    fn default() -> Self {
        Self {
            trial_budget: 40,
            congruent_probability: 0.3,
            streak_for_speedup: 3,
            speed_step: 0.1,
            max_speed: 2.0,
            overdrive_threshold: 1.5,
            initial_display_ms: 1500,
            min_display_ms: 600,
            display_ms_per_speed: 500,
        }
    }
}

impl StroopConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_at_least("stroop.trial_budget", self.trial_budget as f64, 1.0)?;
        check_at_least("stroop.streak_for_speedup", f64::from(self.streak_for_speedup), 1.0)?;
        check_probability("stroop.congruent_probability", self.congruent_probability)?;
        check_at_least("stroop.max_speed", self.max_speed, 1.0)?;
        check_at_least("stroop.overdrive_threshold", self.overdrive_threshold, 1.0)?;
        if !(self.speed_step > 0.0) {
            return Err(ConfigError::inconsistent(
                "stroop.speed_step",
                format!("must be positive, got {}", self.speed_step),
            ));
        }
        if self.min_display_ms > self.initial_display_ms {
            return Err(ConfigError::inconsistent(
                "stroop.min_display_ms",
                format!(
                    "floor {} ms exceeds the initial display time {} ms",
                    self.min_display_ms, self.initial_display_ms
                ),
            ));
        }
        Ok(())
    }

    fn max_speed_steps(&self) -> u32 {
        ((self.max_speed - 1.0) / self.speed_step + SPEED_EPSILON).floor() as u32
    }
}

/// Generator, classifier and speed controller for the Stroop task.
#[derive(Debug, Clone)]
pub struct StroopRules {
    config: StroopConfig,
    streak: u32,
    speed_steps: u32,
    overdrive: bool,
}

pub type StroopEngine = TrialRunner<StroopRules>;
pub type StroopTrial = TaskTrial<StroopRules>;

impl StroopRules {
    pub fn new(config: StroopConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            streak: 0,
            speed_steps: 0,
            overdrive: false,
        })
    }

    pub fn config(&self) -> &StroopConfig {
        &self.config
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn speed_multiplier(&self) -> f64 {
        (1.0 + f64::from(self.speed_steps) * self.config.speed_step).min(self.config.max_speed)
    }

    /// Time the current stimulus stays on screen before it times out.
    pub fn display_time_ms(&self) -> u32 {
        let shortened = f64::from(self.config.initial_display_ms)
            - (self.speed_multiplier() - 1.0) * f64::from(self.config.display_ms_per_speed);
        (shortened.round().max(0.0) as u32).max(self.config.min_display_ms)
    }

    pub fn overdrive(&self) -> bool {
        self.overdrive
    }
}

impl TaskRules for StroopRules {
    type Stimulus = StroopItem;
    type Action = StroopAction;
    type Category = GoNoGoOutcome;
    type Params = StroopParams;
    type Metrics = StroopMetrics;

    const TASK_ID: &'static str = "stroop";

    fn trial_budget(&self) -> usize {
        self.config.trial_budget
    }

    fn restart(&mut self, _rng: &mut StdRng) {
        self.streak = 0;
        self.speed_steps = 0;
        self.overdrive = false;
    }

    fn params(&self) -> StroopParams {
        StroopParams {
            speed_multiplier: self.speed_multiplier(),
            display_time_ms: self.display_time_ms(),
            overdrive: self.overdrive,
        }
    }

    fn generate(&self, id: u64, _history: &VecDeque<StroopItem>, rng: &mut StdRng) -> StroopItem {
        generate_item(id, self.config.congruent_probability, rng)
    }

    fn classify(&self, item: &StroopItem, signal: &Signal<StroopAction>) -> Verdict<GoNoGoOutcome> {
        classify_response(item, signal)
    }

    fn adapt(&mut self, verdict: &Verdict<GoNoGoOutcome>, _rng: &mut StdRng) -> Option<StroopParams> {
        if !verdict.correct {
            self.streak = 0;
            return None;
        }

        // Inhibitions extend the streak; only a tap can complete a speed-up.
        self.streak = self.streak.saturating_add(1);
        if verdict.category != GoNoGoOutcome::Hit
            || self.streak % self.config.streak_for_speedup != 0
            || self.speed_steps >= self.config.max_speed_steps()
        {
            return None;
        }

        self.speed_steps += 1;
        if !self.overdrive
            && self.speed_multiplier() + SPEED_EPSILON >= self.config.overdrive_threshold
        {
            self.overdrive = true;
            debug!(speed = self.speed_multiplier(), "overdrive engaged");
        }
        Some(self.params())
    }

    fn reduce(&self, trials: &[StroopTrial]) -> StroopMetrics {
        StroopMetrics::from_trials(trials)
    }
}

/// Congruent (word names the ink) with probability `congruent_probability`;
/// otherwise the ink is drawn uniformly from the two colours the word does not name.
pub fn generate_item(id: u64, congruent_probability: f64, rng: &mut StdRng) -> StroopItem {
    let word_index = rng.gen_range(0..WORDS.len());
    let color_index = if rng.gen_bool(congruent_probability) {
        word_index
    } else {
        (word_index + rng.gen_range(1..INKS.len())) % INKS.len()
    };
    StroopItem::new(id, WORDS[word_index], INKS[color_index])
}

pub fn classify_response(item: &StroopItem, signal: &Signal<StroopAction>) -> Verdict<GoNoGoOutcome> {
    let (correct, category) = match (signal.is_act(), item.should_respond) {
        (true, true) => (true, GoNoGoOutcome::Hit),
        (true, false) => (false, GoNoGoOutcome::ImpulseError),
        (false, true) => (false, GoNoGoOutcome::OmissionError),
        (false, false) => (true, GoNoGoOutcome::CorrectInhibition),
    };
    Verdict { correct, category }
}

impl TrialRunner<StroopRules> {
    pub fn with_config(config: StroopConfig, seed: u64) -> ConfigResult<Self> {
        Ok(Self::new(StroopRules::new(config)?, seed))
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.rules().speed_multiplier()
    }

    pub fn display_time_ms(&self) -> u32 {
        self.rules().display_time_ms()
    }

    pub fn overdrive(&self) -> bool {
        self.rules().overdrive()
    }

    pub fn streak(&self) -> u32 {
        self.rules().streak()
    }
}
