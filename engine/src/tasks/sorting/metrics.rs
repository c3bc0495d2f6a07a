//! Set-shifting summary for card-sorting runs.

use serde::{Deserialize, Serialize};

use crate::core::stats::{ratio, round_to};

use super::engine::{SortOutcome, SortingTrial};

const POINTS_PER_CORRECT: u32 = 100;
const ADAPTIVE_SOLVER_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SortingMetrics {
    pub total_trials: usize,
    pub correct_count: u32,
    pub total_errors: u32,
    pub perseverative_errors: u32,
    pub non_perseverative_errors: u32,
    pub categories_completed: u32,
    pub rule_changes: u32,
    /// `(categories / max) × (1 − perseverative / total)`, two decimals.
    pub flexibility_index: f64,
    pub adaptive_solver_achieved: bool,
    /// Overall accuracy as a whole percentage.
    pub conceptual_level_responses: f64,
    pub points: u32,
}

impl SortingMetrics {
    pub fn from_trials(trials: &[SortingTrial], max_categories: u32) -> Self {
        let total_trials = trials.len();
        if total_trials == 0 {
            return Self::default();
        }

        let mut metrics = Self {
            total_trials,
            ..Self::default()
        };

        for trial in trials {
            match trial.category {
                SortOutcome::Correct => {
                    metrics.correct_count += 1;
                    metrics.points = metrics.points.saturating_add(POINTS_PER_CORRECT);
                }
                SortOutcome::Perseverative => metrics.perseverative_errors += 1,
                SortOutcome::NonPerseverative => metrics.non_perseverative_errors += 1,
            }
            if trial.adjusted.is_some_and(|after| after.rule != trial.params.rule) {
                metrics.rule_changes += 1;
            }
        }

        metrics.total_errors = metrics.perseverative_errors + metrics.non_perseverative_errors;
        metrics.categories_completed = trials
            .last()
            .map(|trial| trial.params_after().categories_completed)
            .unwrap_or_default();

        metrics.flexibility_index = flexibility_index(
            metrics.categories_completed,
            max_categories,
            metrics.perseverative_errors,
            total_trials,
        );
        metrics.adaptive_solver_achieved = metrics.flexibility_index > ADAPTIVE_SOLVER_THRESHOLD;
        metrics.conceptual_level_responses =
            (ratio(metrics.correct_count as usize, total_trials) * 100.0).round();

        metrics
    }
}

pub fn flexibility_index(
    categories_completed: u32,
    max_categories: u32,
    perseverative_errors: u32,
    total_trials: usize,
) -> f64 {
    let category_score = if max_categories == 0 {
        0.0
    } else {
        f64::from(categories_completed) / f64::from(max_categories)
    };
    let perseverative_rate = ratio(perseverative_errors as usize, total_trials);
    round_to(category_score * (1.0 - perseverative_rate), 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::session::{Signal, TrialRecord};
    use crate::tasks::sorting::engine::{Card, CardColor, CardShape, SortParams, SortRule};
    use pretty_assertions::assert_eq;

    fn params(rule: SortRule, categories_completed: u32) -> SortParams {
        SortParams {
            rule,
            previous_rule: None,
            window_remaining: 0,
            categories_completed,
        }
    }

    fn trial(index: usize, category: SortOutcome) -> SortingTrial {
        TrialRecord {
            index,
            stimulus: Card {
                id: index as u64,
                shape: CardShape::Circle,
                color: CardColor::Blue,
                count: 2,
            },
            signal: Signal::Act(0),
            correct: category == SortOutcome::Correct,
            category,
            rt_ms: Some(900.0),
            params: params(SortRule::Color, 0),
            adjusted: None,
        }
    }

    #[test]
    fn flexibility_index_formula() {
        assert_eq!(flexibility_index(6, 6, 0, 30), 1.0);
        assert_eq!(flexibility_index(3, 6, 8, 64), 0.44);
        assert_eq!(flexibility_index(0, 6, 0, 10), 0.0);
    }

    #[test]
    fn counts_errors_switches_and_points() {
        let mut switch = trial(4, SortOutcome::Correct);
        switch.adjusted = Some(SortParams {
            previous_rule: Some(SortRule::Color),
            window_remaining: 3,
            ..params(SortRule::Shape, 1)
        });
        let mut after = trial(5, SortOutcome::Perseverative);
        after.params = params(SortRule::Shape, 1);
        let mut last = trial(6, SortOutcome::NonPerseverative);
        last.params = params(SortRule::Shape, 1);

        let trials = vec![
            trial(0, SortOutcome::Correct),
            trial(1, SortOutcome::Correct),
            trial(2, SortOutcome::Correct),
            trial(3, SortOutcome::Correct),
            switch,
            after,
            last,
        ];

        let metrics = SortingMetrics::from_trials(&trials, 6);
        assert_eq!(
            metrics,
            SortingMetrics {
                total_trials: 7,
                correct_count: 5,
                total_errors: 2,
                perseverative_errors: 1,
                non_perseverative_errors: 1,
                categories_completed: 1,
                rule_changes: 1,
                // (1 / 6) × (1 − 1 / 7) = 0.1428…
                flexibility_index: 0.14,
                adaptive_solver_achieved: false,
                // 5 / 7 = 71.4 %
                conceptual_level_responses: 71.0,
                points: 500,
            }
        );
    }

    #[test]
    fn empty_log_yields_default_metrics() {
        assert_eq!(SortingMetrics::from_trials(&[], 6), SortingMetrics::default());
    }
}
