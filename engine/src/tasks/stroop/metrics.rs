//! Response-inhibition summary for Go/No-Go Stroop runs.

use serde::{Deserialize, Serialize};

use crate::core::stats::{mean, ratio, round_to};

use super::engine::{GoNoGoOutcome, StroopTrial};

const POINTS_PER_INHIBITION: u32 = 50;
const BASE_TAP_POINTS: f64 = 100.0;
const IMPULSE_PENALTY_CAP: f64 = 50.0;
const SPEED_BONUS_PIVOT_MS: f64 = 800.0;
/// Impulse error rate (percent) below which the control badge is earned.
const IMPULSE_CONTROL_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StroopMetrics {
    pub total_trials: usize,
    pub go_trials: usize,
    pub no_go_trials: usize,
    pub congruent_trials: usize,
    pub incongruent_trials: usize,
    pub hits: u32,
    pub correct_inhibitions: u32,
    pub impulse_errors: u32,
    pub omission_errors: u32,
    /// Impulse errors as a percentage of no-go trials, one decimal.
    pub impulse_error_rate: f64,
    /// Mean RT over all explicit responses, whole milliseconds.
    pub avg_reaction_time_ms: f64,
    pub congruent_rt_ms: f64,
    pub incongruent_rt_ms: f64,
    /// Incongruent minus congruent mean RT; zero unless both are measured.
    pub stroop_effect_ms: f64,
    pub congruent_accuracy: f64,
    pub incongruent_accuracy: f64,
    pub inhibition_score: u8,
    pub impulse_control_achieved: bool,
    pub peak_speed_multiplier: f64,
    pub overdrive_reached: bool,
    pub points: u32,
}

impl StroopMetrics {
    pub fn from_trials(trials: &[StroopTrial]) -> Self {
        let total_trials = trials.len();
        if total_trials == 0 {
            return Self::default();
        }

        let mut metrics = Self {
            total_trials,
            peak_speed_multiplier: 1.0,
            ..Self::default()
        };
        let mut all_rts = Vec::new();
        let mut congruent_rts = Vec::new();
        let mut incongruent_rts = Vec::new();
        let mut congruent_correct = 0usize;
        let mut incongruent_correct = 0usize;

        for trial in trials {
            let item = &trial.stimulus;
            if item.should_respond {
                metrics.go_trials += 1;
            } else {
                metrics.no_go_trials += 1;
            }
            if item.is_congruent {
                metrics.congruent_trials += 1;
                congruent_correct += usize::from(trial.correct);
            } else {
                metrics.incongruent_trials += 1;
                incongruent_correct += usize::from(trial.correct);
            }

            let after = trial.params_after();
            metrics.peak_speed_multiplier = metrics.peak_speed_multiplier.max(after.speed_multiplier);
            metrics.overdrive_reached |= after.overdrive;

            match trial.category {
                GoNoGoOutcome::Hit => {
                    metrics.hits += 1;
                    let earned = (BASE_TAP_POINTS * after.speed_multiplier).round() as u32;
                    metrics.points = metrics.points.saturating_add(earned);
                }
                GoNoGoOutcome::CorrectInhibition => {
                    metrics.correct_inhibitions += 1;
                    metrics.points = metrics.points.saturating_add(POINTS_PER_INHIBITION);
                }
                GoNoGoOutcome::ImpulseError => metrics.impulse_errors += 1,
                GoNoGoOutcome::OmissionError => metrics.omission_errors += 1,
            }

            if let Some(rt) = trial.rt_ms {
                all_rts.push(rt);
                if item.is_congruent {
                    congruent_rts.push(rt);
                } else {
                    incongruent_rts.push(rt);
                }
            }
        }

        let raw_rate = ratio(metrics.impulse_errors as usize, metrics.no_go_trials) * 100.0;
        metrics.impulse_error_rate = round_to(raw_rate, 1);

        let avg_rt = mean(&all_rts);
        metrics.avg_reaction_time_ms = avg_rt.round();
        metrics.congruent_rt_ms = mean(&congruent_rts).round();
        metrics.incongruent_rt_ms = mean(&incongruent_rts).round();
        metrics.stroop_effect_ms = if congruent_rts.is_empty() || incongruent_rts.is_empty() {
            0.0
        } else {
            (mean(&incongruent_rts) - mean(&congruent_rts)).round()
        };

        metrics.congruent_accuracy = ratio(congruent_correct, metrics.congruent_trials);
        metrics.incongruent_accuracy = ratio(incongruent_correct, metrics.incongruent_trials);
        metrics.inhibition_score = inhibition_score(raw_rate, avg_rt);
        metrics.impulse_control_achieved = raw_rate < IMPULSE_CONTROL_THRESHOLD;

        metrics
    }
}

/// 100, less twice the impulse rate (at most 50), plus a bonus for
/// mean RTs under 800 ms.
pub fn inhibition_score(impulse_error_rate: f64, avg_rt_ms: f64) -> u8 {
    let penalty = (impulse_error_rate * 2.0).min(IMPULSE_PENALTY_CAP);
    let speed_bonus = ((SPEED_BONUS_PIVOT_MS - avg_rt_ms) / 10.0).max(0.0);
    (100.0 - penalty + speed_bonus).clamp(0.0, 100.0).round() as u8
}
