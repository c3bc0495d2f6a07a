use engine::core::qc::QualityFlags;
use engine::core::timing::{Clock, ManualClock};
use engine::tasks::nback::{NBackAction, NBackConfig, NBackEngine, NBackMetrics};
use engine::tasks::sorting::{SortingConfig, SortingEngine};
use engine::tasks::stroop::{StroopAction, StroopConfig, StroopEngine, StroopMetrics};
use engine::{AdvanceOutcome, Phase, Signal};
use pretty_assertions::assert_eq;

fn nback(seed: u64) -> NBackEngine {
    NBackEngine::with_config(NBackConfig::default(), seed).unwrap()
}

/// Plays a whole N-back run, answering every trial correctly.
fn play_nback(engine: &mut NBackEngine, clock: &mut ManualClock) {
    engine.start(clock.now());
    while engine.is_running() {
        let at = clock.advance_ms(520.0);
        let is_target = engine.current().is_some_and(|item| item.is_target);
        if is_target {
            engine.respond(NBackAction::Match, at);
        } else {
            engine.withhold();
        }
        engine.advance(clock.advance_ms(300.0));
    }
}

#[test]
fn log_length_matches_the_trial_budget() {
    let mut engine = nback(11);
    let mut clock = ManualClock::new();
    play_nback(&mut engine, &mut clock);

    assert_eq!(engine.phase(), Phase::Result);
    assert_eq!(engine.completed_trials(), 30);
    assert_eq!(engine.trials().len(), engine.trial_budget());
    for (position, trial) in engine.trials().iter().enumerate() {
        assert_eq!(trial.index, position);
        assert!(trial.correct);
    }
    let metrics = engine.metrics().unwrap();
    assert_eq!(metrics.accuracy, 1.0);
    assert_eq!(metrics.max_n_level, 3);
}

#[test]
fn metrics_are_idempotent() {
    let mut engine = nback(5);
    let mut clock = ManualClock::new();
    play_nback(&mut engine, &mut clock);

    let first = serde_json::to_string(&engine.metrics().unwrap()).unwrap();
    let second = serde_json::to_string(&engine.metrics().unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn same_seed_replays_the_same_stimuli() {
    let mut left = nback(99);
    let mut right = nback(99);
    let mut clock = ManualClock::new();
    play_nback(&mut left, &mut clock);
    play_nback(&mut right, &mut clock);

    let left_items: Vec<_> = left.trials().iter().map(|trial| trial.stimulus).collect();
    let right_items: Vec<_> = right.trials().iter().map(|trial| trial.stimulus).collect();
    assert_eq!(left_items, right_items);
}

#[test]
fn signals_outside_playing_are_ignored() {
    let mut engine = nback(1);
    let mut clock = ManualClock::new();

    assert_eq!(engine.respond(NBackAction::Match, clock.now()), None);
    assert_eq!(engine.withhold(), None);
    assert_eq!(engine.timeout(0), None);
    assert_eq!(engine.advance(clock.now()), AdvanceOutcome::Ignored);
    assert!(engine.metrics().is_none());

    play_nback(&mut engine, &mut clock);
    let frozen: NBackMetrics = engine.metrics().unwrap();

    assert_eq!(engine.respond(NBackAction::Match, clock.now()), None);
    assert_eq!(engine.advance(clock.now()), AdvanceOutcome::Ignored);
    assert!(engine.start(clock.now()).is_none());
    assert_eq!(engine.completed_trials(), 30);
    assert_eq!(engine.metrics().unwrap(), frozen);
}

#[test]
fn only_the_first_signal_per_trial_counts() {
    let mut engine = StroopEngine::with_config(StroopConfig::default(), 2).unwrap();
    let mut clock = ManualClock::new();
    engine.start(clock.now());

    assert_eq!(engine.advance(clock.now()), AdvanceOutcome::Ignored);
    assert!(engine.awaiting_response());

    let at = clock.advance_ms(420.0);
    let first = engine.respond(StroopAction::Tap, at);
    assert!(first.is_some());
    assert!(!engine.awaiting_response());
    assert_eq!(engine.respond(StroopAction::Tap, clock.advance_ms(50.0)), None);
    assert_eq!(engine.withhold(), None);
    assert_eq!(engine.timeout(0), None);

    assert!(matches!(engine.advance(clock.now()), AdvanceOutcome::Next(_)));
    assert_eq!(engine.completed_trials(), 1);
    let trial = &engine.trials()[0];
    assert_eq!(trial.signal, Signal::Act(StroopAction::Tap));
    assert_eq!(trial.rt_ms, Some(420.0));
    assert_eq!(Some(trial.correct), first);
}

#[test]
fn stale_timeouts_do_not_score_later_trials() {
    let mut engine = StroopEngine::with_config(StroopConfig::default(), 6).unwrap();
    let mut clock = ManualClock::new();
    engine.start(clock.now());

    engine.withhold();
    engine.advance(clock.advance_ms(1_500.0));
    assert_eq!(engine.current_index(), Some(1));

    // The timer armed for trial 0 fires late.
    assert_eq!(engine.timeout(0), None);
    assert!(engine.awaiting_response());

    assert!(engine.timeout(1).is_some());
    engine.advance(clock.advance_ms(1_500.0));
    let timed_out = &engine.trials()[1];
    assert_eq!(timed_out.signal, Signal::Timeout);
    assert_eq!(timed_out.rt_ms, None);
}

#[test]
fn timeouts_alone_complete_a_stroop_run() {
    let mut engine = StroopEngine::with_config(StroopConfig::default(), 8).unwrap();
    let mut clock = ManualClock::new();
    engine.start(clock.now());

    let mut completed = false;
    while let Some(index) = engine.current_index() {
        engine.timeout(index);
        if engine.advance(clock.advance_ms(1_500.0)) == AdvanceOutcome::RunCompleted {
            completed = true;
            break;
        }
    }

    assert!(completed);
    let metrics: StroopMetrics = engine.metrics().unwrap();
    assert_eq!(metrics.total_trials, 40);
    assert_eq!(metrics.hits + metrics.impulse_errors, 0);
    assert_eq!(metrics.omission_errors as usize, metrics.go_trials);
    assert_eq!(metrics.impulse_error_rate, 0.0);
    assert_eq!(metrics.avg_reaction_time_ms, 0.0);
}

#[test]
fn reset_returns_to_intro_and_allows_a_new_run() {
    let mut engine = SortingEngine::with_config(SortingConfig::default(), 21).unwrap();
    let mut clock = ManualClock::new();
    engine.start(clock.now());
    let at = clock.advance_ms(800.0);
    if let Some(bin) = engine.correct_bin() {
        engine.respond(bin, at);
    }
    engine.advance(at);
    engine.log_focus_loss();
    assert_eq!(engine.run_id(), 1);

    engine.reset();
    assert_eq!(engine.phase(), Phase::Intro);
    assert!(engine.trials().is_empty());
    assert!(engine.current().is_none());
    assert_eq!(engine.qc(), &QualityFlags::pristine());

    let first = engine.start(clock.now()).unwrap();
    assert_eq!(first.id, 0);
    assert_eq!(engine.run_id(), 2);
    assert_eq!(engine.categories_completed(), 0);
}

#[test]
fn summary_carries_metrics_and_quality_flags() {
    let mut engine = StroopEngine::with_config(StroopConfig::default(), 4).unwrap();
    let mut clock = ManualClock::new();
    assert!(engine.summary().is_none());

    engine.start(clock.now());
    engine.log_focus_loss();
    engine.log_visibility_blur();
    while engine.is_running() {
        let at = clock.advance_ms(450.0);
        let should_respond = engine.current().is_some_and(|item| item.should_respond);
        if should_respond {
            engine.respond(StroopAction::Tap, at);
        } else {
            engine.withhold();
        }
        engine.advance(at);
    }

    let record = engine.summary().unwrap().unwrap();
    assert_eq!(record.task, "stroop");
    assert_eq!(record.qc.focus_lost_events, 1);
    assert_eq!(record.qc.visibility_blur_events, 1);
    assert!(record.qc.min_trials_met);

    let decoded: StroopMetrics = record.metrics_as().unwrap();
    assert_eq!(decoded, engine.metrics().unwrap());
    assert_eq!(decoded.impulse_errors, 0);
    assert_eq!(decoded.peak_speed_multiplier, engine.speed_multiplier());
    assert!(decoded.impulse_control_achieved);
}

#[test]
fn early_advance_keeps_the_unscored_trial_on_screen() {
    let mut engine = nback(17);
    let mut clock = ManualClock::new();
    let first = engine.start(clock.now()).unwrap();

    for _ in 0..3 {
        assert_eq!(engine.advance(clock.advance_ms(100.0)), AdvanceOutcome::Ignored);
    }
    assert_eq!(engine.current(), Some(&first));
    assert_eq!(engine.current_index(), Some(0));
    assert!(engine.awaiting_response());
    assert!(engine.trials().is_empty());

    engine.withhold();
    assert!(matches!(engine.advance(clock.now()), AdvanceOutcome::Next(_)));
    assert_eq!(engine.completed_trials(), 1);
    assert_eq!(engine.trials()[0].stimulus, first);
    assert_eq!(engine.current_index(), Some(1));
}
