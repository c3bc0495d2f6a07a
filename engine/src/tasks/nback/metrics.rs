//! Metric definitions and aggregation helpers for N-back runs.

use serde::{Deserialize, Serialize};

use crate::core::probit::{clamp_rate, probit};
use crate::core::stats::{mean, median, ratio, std_dev};

use super::engine::{NBackOutcome, NBackTrial};

const ACCURACY_WEIGHT: f64 = 0.4;
const LEVEL_WEIGHT: f64 = 0.3;
const SENSITIVITY_WEIGHT: f64 = 0.3;
const POINTS_PER_LEVEL: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NBackMetrics {
    pub total_trials: usize,
    pub target_trials: usize,
    pub non_target_trials: usize,
    pub hits: u32,
    pub misses: u32,
    pub false_alarms: u32,
    pub correct_rejections: u32,
    pub hit_rate: f64,
    pub false_alarm_rate: f64,
    /// Fraction of trials scored correct, in `[0, 1]`.
    pub accuracy: f64,
    pub d_prime: f64,
    pub criterion: f64,
    /// Mean RT over trials with an explicit response.
    pub mean_rt_ms: f64,
    pub median_rt_ms: f64,
    pub sd_rt_ms: f64,
    pub response_count: u32,
    pub max_n_level: u8,
    /// Composite 0–100: 40% accuracy, 30% level reached, 30% sensitivity.
    pub working_memory_score: u8,
    pub points: u32,
}

impl NBackMetrics {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_trials(trials: &[NBackTrial], level_ceiling: u8) -> Self {
        let total_trials = trials.len();
        if total_trials == 0 {
            return Self::default();
        }

        let mut hits = 0u32;
        let mut misses = 0u32;
        let mut false_alarms = 0u32;
        let mut correct_rejections = 0u32;
        let mut points = 0u32;
        let mut max_n_level = 0u8;
        let mut response_rts = Vec::new();

        for trial in trials {
            max_n_level = max_n_level
                .max(trial.params.n_level)
                .max(trial.params_after().n_level);

            match trial.category {
                NBackOutcome::Hit => {
                    hits = hits.saturating_add(1);
                    points = points.saturating_add(
                        POINTS_PER_LEVEL * u32::from(trial.params_after().n_level),
                    );
                }
                NBackOutcome::Miss => misses = misses.saturating_add(1),
                NBackOutcome::FalseAlarm => false_alarms = false_alarms.saturating_add(1),
                NBackOutcome::CorrectRejection => {
                    correct_rejections = correct_rejections.saturating_add(1)
                }
            }

            if let Some(rt) = trial.rt_ms {
                response_rts.push(rt);
            }
        }

        let target_trials = (hits + misses) as usize;
        let non_target_trials = (false_alarms + correct_rejections) as usize;
        let correct_count = (hits + correct_rejections) as usize;

        let hit_rate = ratio(hits as usize, target_trials);
        let false_alarm_rate = ratio(false_alarms as usize, non_target_trials);
        let (d_prime, criterion) = signal_detection_indices(hit_rate, false_alarm_rate);
        let accuracy = ratio(correct_count, total_trials);

        let mean_rt_ms = mean(&response_rts);
        let median_rt_ms = median(&response_rts);
        let sd_rt_ms = std_dev(&response_rts, mean_rt_ms);

        let working_memory_score =
            composite_score(accuracy, max_n_level, level_ceiling, d_prime);

        Self {
            total_trials,
            target_trials,
            non_target_trials,
            hits,
            misses,
            false_alarms,
            correct_rejections,
            hit_rate,
            false_alarm_rate,
            accuracy,
            d_prime,
            criterion,
            mean_rt_ms,
            median_rt_ms,
            sd_rt_ms,
            response_count: hits + false_alarms,
            max_n_level,
            working_memory_score,
            points,
        }
    }
}

/// d′ and criterion c from raw rates, each clamped to `[0.01, 0.99]` first.
pub fn signal_detection_indices(hit_rate: f64, false_alarm_rate: f64) -> (f64, f64) {
    let z_hit = probit(clamp_rate(hit_rate));
    let z_fa = probit(clamp_rate(false_alarm_rate));

    let d_prime = z_hit - z_fa;
    let criterion = -0.5 * (z_hit + z_fa);

    (d_prime, criterion)
}

fn composite_score(accuracy: f64, max_n_level: u8, level_ceiling: u8, d_prime: f64) -> u8 {
    let normalized_level = if level_ceiling > 1 {
        (f64::from(max_n_level.saturating_sub(1)) / f64::from(level_ceiling - 1)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    // d′ of −1 maps to 0, +3 maps to 1.
    let normalized_d_prime = ((d_prime + 1.0) / 4.0).clamp(0.0, 1.0);

    let blended = accuracy.clamp(0.0, 1.0) * ACCURACY_WEIGHT
        + normalized_level * LEVEL_WEIGHT
        + normalized_d_prime * SENSITIVITY_WEIGHT;
    (blended * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::nback::engine::{Color, NBackAction, NBackItem, NBackParams, Shape};
    use crate::tasks::session::{Signal, TrialRecord};

    fn trial(
        index: usize,
        is_target: bool,
        category: NBackOutcome,
        rt_ms: Option<f64>,
        n_level: u8,
    ) -> NBackTrial {
        let correct = matches!(category, NBackOutcome::Hit | NBackOutcome::CorrectRejection);
        TrialRecord {
            index,
            stimulus: NBackItem {
                id: index as u64,
                shape: Shape::Circle,
                color: Color::Red,
                is_target,
            },
            signal: if rt_ms.is_some() {
                Signal::Act(NBackAction::Match)
            } else {
                Signal::Withhold
            },
            correct,
            category,
            rt_ms,
            params: NBackParams { n_level },
            adjusted: None,
        }
    }

    #[test]
    fn metrics_count_hits_and_false_alarms() {
        let trials = vec![
            trial(0, false, NBackOutcome::CorrectRejection, None, 1),
            trial(1, false, NBackOutcome::FalseAlarm, Some(420.0), 1),
            trial(2, true, NBackOutcome::Hit, Some(480.0), 1),
            trial(3, true, NBackOutcome::Miss, None, 1),
        ];

        let metrics = NBackMetrics::from_trials(&trials, 3);
        assert_eq!(metrics.total_trials, 4);
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.false_alarms, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.correct_rejections, 1);
        assert_eq!(metrics.accuracy, 0.5);
        assert_eq!(metrics.mean_rt_ms, 450.0);
        assert_eq!(metrics.median_rt_ms, 450.0);
        assert_eq!(metrics.response_count, 2);
        assert_eq!(metrics.points, 100);
        assert!(metrics.d_prime.abs() < 1e-12);
        assert!(metrics.criterion.abs() < 1e-12);
    }

    #[test]
    fn perfect_discrimination_hits_the_clamped_ceiling() {
        let trials = vec![
            trial(0, true, NBackOutcome::Hit, Some(500.0), 1),
            trial(1, false, NBackOutcome::CorrectRejection, None, 1),
        ];
        let metrics = NBackMetrics::from_trials(&trials, 3);
        let expected = probit(0.99) - probit(0.01);
        assert!((metrics.d_prime - expected).abs() < 1e-12);
        assert!(metrics.d_prime.is_finite());
    }

    #[test]
    fn composite_blends_accuracy_level_and_sensitivity() {
        // Full accuracy (0.4) + level 3 of 3 (0.3) + d′ above 3 (0.3).
        assert_eq!(composite_score(1.0, 3, 3, 4.65), 100);
        // Chance accuracy at level 1 with d′ = 1: 0.2 + 0 + 0.15.
        assert_eq!(composite_score(0.5, 1, 3, 1.0), 35);
        // Level 2 of 3 counts half the level weight.
        assert_eq!(composite_score(0.0, 2, 3, -1.0), 15);
    }

    #[test]
    fn max_level_includes_a_level_up_on_the_final_trial() {
        let mut last = trial(1, true, NBackOutcome::Hit, Some(400.0), 1);
        last.adjusted = Some(NBackParams { n_level: 2 });
        let trials = vec![trial(0, false, NBackOutcome::CorrectRejection, None, 1), last];

        let metrics = NBackMetrics::from_trials(&trials, 3);
        assert_eq!(metrics.max_n_level, 2);
        assert_eq!(metrics.points, 200);
    }

    #[test]
    fn empty_log_yields_default_metrics() {
        assert_eq!(NBackMetrics::from_trials(&[], 3), NBackMetrics::empty());
    }
}
