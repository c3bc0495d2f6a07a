//! Card-sorting set-shifting task with a hidden, periodically switching rule.

use std::collections::VecDeque;
use std::fmt;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{check_at_least, ConfigResult};
use crate::tasks::session::{Signal, TaskRules, TaskTrial, TrialRunner, Verdict};

use super::metrics::SortingMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortRule {
    Color,
    Shape,
    Number,
}

impl SortRule {
    pub const ALL: [SortRule; 3] = [SortRule::Color, SortRule::Shape, SortRule::Number];

    /// The two rules a switch away from `self` may land on.
    pub fn others(self) -> [SortRule; 2] {
        match self {
            SortRule::Color => [SortRule::Shape, SortRule::Number],
            SortRule::Shape => [SortRule::Color, SortRule::Number],
            SortRule::Number => [SortRule::Color, SortRule::Shape],
        }
    }
}

impl fmt::Display for SortRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SortRule::Color => "COLOR",
            SortRule::Shape => "SHAPE",
            SortRule::Number => "NUMBER",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardShape {
    Circle,
    Square,
    Triangle,
    Star,
}

impl CardShape {
    pub const ALL: [CardShape; 4] = [
        CardShape::Circle,
        CardShape::Square,
        CardShape::Triangle,
        CardShape::Star,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl CardColor {
    pub const ALL: [CardColor; 4] = [CardColor::Red, CardColor::Blue, CardColor::Green, CardColor::Yellow];
}

pub const CARD_COUNTS: [u8; 4] = [1, 2, 3, 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: u64,
    pub shape: CardShape,
    pub color: CardColor,
    pub count: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetBin {
    pub id: usize,
    pub shape: CardShape,
    pub color: CardColor,
    pub count: u8,
}

impl TargetBin {
    pub fn matches(&self, card: &Card, rule: SortRule) -> bool {
        match rule {
            SortRule::Color => card.color == self.color,
            SortRule::Shape => card.shape == self.shape,
            SortRule::Number => card.count == self.count,
        }
    }
}

/// Every attribute value appears in exactly one bin, so no rule can tie.
pub const STANDARD_BINS: [TargetBin; 4] = [
    TargetBin {
        id: 0,
        shape: CardShape::Triangle,
        color: CardColor::Red,
        count: 1,
    },
    TargetBin {
        id: 1,
        shape: CardShape::Star,
        color: CardColor::Green,
        count: 2,
    },
    TargetBin {
        id: 2,
        shape: CardShape::Circle,
        color: CardColor::Yellow,
        count: 3,
    },
    TargetBin {
        id: 3,
        shape: CardShape::Square,
        color: CardColor::Blue,
        count: 4,
    },
];

/// Index of the bin the card belongs to under `rule`. `None` only for cards
/// outside the standard deck.
pub fn correct_bin(card: &Card, rule: SortRule) -> Option<usize> {
    STANDARD_BINS.iter().position(|bin| bin.matches(card, rule))
}

/// Bin selected by the participant, `0..STANDARD_BINS.len()`.
pub type BinIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOutcome {
    Correct,
    /// Wrong bin that the previous rule would have accepted, shortly after a switch.
    Perseverative,
    NonPerseverative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortParams {
    pub rule: SortRule,
    pub previous_rule: Option<SortRule>,
    /// Trials left in the post-switch perseveration window.
    pub window_remaining: u32,
    pub categories_completed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortingConfig {
    pub trial_budget: usize,
    pub streak_for_switch: u32,
    pub max_categories: u32,
    pub perseveration_window: u32,
    /// Fixed starting rule; drawn at random on every start when absent.
    pub initial_rule: Option<SortRule>,
}

impl Default for SortingConfig {
    fn default() -> Self {
        Self {
            trial_budget: 64,
            streak_for_switch: 5,
            max_categories: 6,
            perseveration_window: 3,
            initial_rule: None,
        }
    }
}

impl SortingConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_at_least("sorting.trial_budget", self.trial_budget as f64, 1.0)?;
        check_at_least("sorting.streak_for_switch", f64::from(self.streak_for_switch), 1.0)?;
        check_at_least("sorting.max_categories", f64::from(self.max_categories), 1.0)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SortingRules {
    config: SortingConfig,
    rule: SortRule,
    previous_rule: Option<SortRule>,
    window_remaining: u32,
    streak: u32,
    categories_completed: u32,
}

pub type SortingEngine = TrialRunner<SortingRules>;
pub type SortingTrial = TaskTrial<SortingRules>;

impl SortingRules {
    pub fn new(config: SortingConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            rule: config.initial_rule.unwrap_or(SortRule::Color),
            config,
            previous_rule: None,
            window_remaining: 0,
            streak: 0,
            categories_completed: 0,
        })
    }

    pub fn config(&self) -> &SortingConfig {
        &self.config
    }

    pub fn current_rule(&self) -> SortRule {
        self.rule
    }

    pub fn previous_rule(&self) -> Option<SortRule> {
        self.previous_rule
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn categories_completed(&self) -> u32 {
        self.categories_completed
    }

    pub fn in_perseveration_window(&self) -> bool {
        self.window_remaining > 0 && self.previous_rule.is_some()
    }

    fn switch_rule(&mut self, rng: &mut StdRng) {
        let others = self.rule.others();
        let next = others[rng.gen_range(0..others.len())];
        debug!(from = %self.rule, to = %next, "sort rule switched");
        self.previous_rule = Some(self.rule);
        self.rule = next;
        self.window_remaining = self.config.perseveration_window;
        self.categories_completed += 1;
        self.streak = 0;
    }
}

impl TaskRules for SortingRules {
    type Stimulus = Card;
    type Action = BinIndex;
    type Category = SortOutcome;
    type Params = SortParams;
    type Metrics = SortingMetrics;

    const TASK_ID: &'static str = "sorting";

    fn trial_budget(&self) -> usize {
        self.config.trial_budget
    }

    fn restart(&mut self, rng: &mut StdRng) {
        self.rule = match self.config.initial_rule {
            Some(rule) => rule,
            None => SortRule::ALL[rng.gen_range(0..SortRule::ALL.len())],
        };
        self.previous_rule = None;
        self.window_remaining = 0;
        self.streak = 0;
        self.categories_completed = 0;
    }

    fn params(&self) -> SortParams {
        SortParams {
            rule: self.rule,
            previous_rule: self.previous_rule,
            window_remaining: self.window_remaining,
            categories_completed: self.categories_completed,
        }
    }

    fn generate(&self, id: u64, _history: &VecDeque<Card>, rng: &mut StdRng) -> Card {
        generate_card(id, rng)
    }

    fn classify(&self, card: &Card, signal: &Signal<BinIndex>) -> Verdict<SortOutcome> {
        let category = match signal {
            Signal::Act(bin) if correct_bin(card, self.rule) == Some(*bin) => SortOutcome::Correct,
            Signal::Act(bin) => {
                let followed_previous_rule = self.in_perseveration_window()
                    && self.previous_rule.is_some_and(|previous| {
                        STANDARD_BINS
                            .get(*bin)
                            .is_some_and(|target| target.matches(card, previous))
                    });
                if followed_previous_rule {
                    SortOutcome::Perseverative
                } else {
                    SortOutcome::NonPerseverative
                }
            }
            Signal::Withhold | Signal::Timeout => SortOutcome::NonPerseverative,
        };
        Verdict {
            correct: category == SortOutcome::Correct,
            category,
        }
    }

    /// Only a rule switch counts as a parameter change; the window countdown
    /// is visible through [`TaskRules::params`].
    fn adapt(&mut self, verdict: &Verdict<SortOutcome>, rng: &mut StdRng) -> Option<SortParams> {
        self.streak = if verdict.correct { self.streak + 1 } else { 0 };

        if self.streak >= self.config.streak_for_switch {
            self.switch_rule(rng);
            return Some(self.params());
        }

        self.window_remaining = self.window_remaining.saturating_sub(1);
        None
    }

    fn goal_reached(&self) -> bool {
        self.categories_completed >= self.config.max_categories
    }

    fn reduce(&self, trials: &[SortingTrial]) -> SortingMetrics {
        SortingMetrics::from_trials(trials, self.config.max_categories)
    }
}

/// Uniform over shape × colour × count, independent of the bins.
pub fn generate_card(id: u64, rng: &mut StdRng) -> Card {
    Card {
        id,
        shape: CardShape::ALL[rng.gen_range(0..CardShape::ALL.len())],
        color: CardColor::ALL[rng.gen_range(0..CardColor::ALL.len())],
        count: CARD_COUNTS[rng.gen_range(0..CARD_COUNTS.len())],
    }
}

impl TrialRunner<SortingRules> {
    pub fn with_config(config: SortingConfig, seed: u64) -> ConfigResult<Self> {
        Ok(Self::new(SortingRules::new(config)?, seed))
    }

    pub fn bins(&self) -> &'static [TargetBin; 4] {
        &STANDARD_BINS
    }

    pub fn current_rule(&self) -> SortRule {
        self.rules().current_rule()
    }

    pub fn previous_rule(&self) -> Option<SortRule> {
        self.rules().previous_rule()
    }

    pub fn categories_completed(&self) -> u32 {
        self.rules().categories_completed()
    }

    pub fn streak(&self) -> u32 {
        self.rules().streak()
    }

    /// The bin the current card belongs to under the hidden rule.
    pub fn correct_bin(&self) -> Option<usize> {
        self.current()
            .and_then(|card| correct_bin(card, self.current_rule()))
    }
}
