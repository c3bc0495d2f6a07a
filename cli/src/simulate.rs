//! Scripted participant that plays complete runs against the engines.

use anyhow::{anyhow, Result};
use engine::core::timing::{Clock, ManualClock};
use engine::tasks::nback::{NBackAction, NBackConfig, NBackEngine};
use engine::tasks::sorting::{correct_bin, SortingConfig, SortingEngine, STANDARD_BINS};
use engine::tasks::stroop::{StroopAction, StroopConfig, StroopEngine};
use engine::SummaryRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Pause between feedback and the next stimulus.
const INTER_TRIAL_MS: f64 = 250.0;
const MIN_RT_MS: f64 = 150.0;

#[derive(Debug, Clone, Copy)]
pub struct ParticipantProfile {
    /// Chance of answering any trial correctly.
    pub accuracy: f64,
    pub rt_mean_ms: f64,
    /// Chance of sorting by the old rule inside the post-switch window.
    pub perseveration: f64,
}

pub struct Participant {
    profile: ParticipantProfile,
    rng: StdRng,
}

impl Participant {
    pub fn new(profile: ParticipantProfile, seed: u64) -> Self {
        Self {
            profile,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn answers_correctly(&mut self) -> bool {
        self.rng.gen_bool(self.profile.accuracy)
    }

    fn perseverates(&mut self) -> bool {
        self.rng.gen_bool(self.profile.perseveration)
    }

    /// Mean RT with ±25% uniform jitter.
    fn reaction_time(&mut self) -> f64 {
        let jitter = self.rng.gen_range(-0.25..=0.25);
        (self.profile.rt_mean_ms * (1.0 + jitter)).max(MIN_RT_MS)
    }
}

fn finish(summary: Option<Result<SummaryRecord, serde_json::Error>>, task: &str) -> Result<SummaryRecord> {
    summary
        .ok_or_else(|| anyhow!("{task} run ended without a result"))?
        .map_err(Into::into)
}

pub fn run_nback(config: NBackConfig, seed: u64, participant: &mut Participant) -> Result<SummaryRecord> {
    let mut engine = NBackEngine::with_config(config, seed)?;
    let mut clock = ManualClock::new();
    engine.start(clock.now());

    while let Some(item) = engine.current().copied() {
        let at = clock.advance_ms(participant.reaction_time());
        let claims_match = item.is_target == participant.answers_correctly();
        if claims_match {
            engine.respond(NBackAction::Match, at);
        } else {
            engine.withhold();
        }
        engine.advance(clock.advance_ms(INTER_TRIAL_MS));
    }

    debug!(trials = engine.completed_trials(), n_level = engine.n_level(), "n-back simulation done");
    finish(engine.summary(), "nback")
}

pub fn run_stroop(config: StroopConfig, seed: u64, participant: &mut Participant) -> Result<SummaryRecord> {
    let mut engine = StroopEngine::with_config(config, seed)?;
    let mut clock = ManualClock::new();
    engine.start(clock.now());

    while let (Some(item), Some(index)) = (engine.current().copied(), engine.current_index()) {
        let window = f64::from(engine.display_time_ms());
        let taps = item.should_respond == participant.answers_correctly();
        let rt = participant.reaction_time();

        if taps && rt < window {
            let at = clock.advance_ms(rt);
            engine.respond(StroopAction::Tap, at);
            clock.advance_ms(window - rt);
        } else {
            clock.advance_ms(window);
            engine.timeout(index);
        }
        engine.advance(clock.advance_ms(INTER_TRIAL_MS));
    }

    debug!(
        trials = engine.completed_trials(),
        speed = engine.speed_multiplier(),
        "stroop simulation done"
    );
    finish(engine.summary(), "stroop")
}

pub fn run_sorting(config: SortingConfig, seed: u64, participant: &mut Participant) -> Result<SummaryRecord> {
    let mut engine = SortingEngine::with_config(config, seed)?;
    let mut clock = ManualClock::new();
    engine.start(clock.now());

    while let Some(card) = engine.current().copied() {
        let right = engine.correct_bin().unwrap_or(0);
        let stale = engine
            .previous_rule()
            .filter(|_| engine.rules().in_perseveration_window())
            .and_then(|previous| correct_bin(&card, previous));

        let choice = match stale {
            Some(bin) if participant.perseverates() => bin,
            _ if participant.answers_correctly() => right,
            _ => {
                let offset = participant.rng.gen_range(1..STANDARD_BINS.len());
                (right + offset) % STANDARD_BINS.len()
            }
        };

        let at = clock.advance_ms(participant.reaction_time());
        engine.respond(choice, at);
        engine.advance(clock.advance_ms(INTER_TRIAL_MS));
    }

    debug!(
        trials = engine.completed_trials(),
        categories = engine.categories_completed(),
        "sorting simulation done"
    );
    finish(engine.summary(), "sorting")
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::tasks::nback::NBackMetrics;
    use engine::tasks::sorting::SortingMetrics;
    use engine::tasks::stroop::StroopMetrics;

    fn perfect() -> Participant {
        Participant::new(
            ParticipantProfile {
                accuracy: 1.0,
                rt_mean_ms: 500.0,
                perseveration: 0.0,
            },
            1,
        )
    }

    #[test]
    fn perfect_participant_maxes_out_each_task() {
        let mut participant = perfect();

        let nback: NBackMetrics = run_nback(NBackConfig::default(), 3, &mut participant)
            .unwrap()
            .metrics_as()
            .unwrap();
        assert_eq!(nback.accuracy, 1.0);
        assert_eq!(nback.max_n_level, 3);

        let stroop: StroopMetrics = run_stroop(StroopConfig::default(), 3, &mut participant)
            .unwrap()
            .metrics_as()
            .unwrap();
        assert_eq!(stroop.total_trials, 40);
        assert_eq!(stroop.impulse_errors + stroop.omission_errors, 0);

        let sorting: SortingMetrics = run_sorting(SortingConfig::default(), 3, &mut participant)
            .unwrap()
            .metrics_as()
            .unwrap();
        assert_eq!(sorting.categories_completed, 6);
        assert_eq!(sorting.total_trials, 30);
        assert_eq!(sorting.flexibility_index, 1.0);
    }

    #[test]
    fn stubborn_sorter_racks_up_perseverative_errors() {
        let mut participant = Participant::new(
            ParticipantProfile {
                accuracy: 1.0,
                rt_mean_ms: 900.0,
                perseveration: 1.0,
            },
            9,
        );
        let sorting: SortingMetrics = run_sorting(SortingConfig::default(), 4, &mut participant)
            .unwrap()
            .metrics_as()
            .unwrap();
        assert!(sorting.categories_completed >= 1);
        assert!(sorting.perseverative_errors >= 1);
    }
}
