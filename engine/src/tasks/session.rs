//! Trial state machine shared by every assessment paradigm.
//!
//! A [`TrialRunner`] walks `intro → playing → result`. While playing it owns
//! exactly one in-flight trial: the stimulus on screen, the time it appeared
//! and, once the first signal arrives, that signal's verdict. Later signals
//! for the same trial are ignored. [`TrialRunner::advance`] commits the scored
//! trial to the append-only log and either presents the next stimulus or ends
//! the run. Task specifics live behind [`TaskRules`].

use std::collections::VecDeque;
use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::core::qc::QualityFlags;
use crate::core::summary::SummaryRecord;
use crate::core::timing::InstantStamp;

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Intro,
    Playing,
    Result,
}

/// What the participant did on a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal<A> {
    /// An explicit response (match assertion, tap, bin choice).
    Act(A),
    /// An explicit decision not to respond.
    Withhold,
    /// The display window elapsed without a response.
    Timeout,
}

impl<A> Signal<A> {
    pub fn is_act(&self) -> bool {
        matches!(self, Signal::Act(_))
    }
}

/// Classifier output for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict<C> {
    pub correct: bool,
    pub category: C,
}

/// Immutable result of one completed trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord<S, A, C, P> {
    pub index: usize,
    pub stimulus: S,
    pub signal: Signal<A>,
    pub correct: bool,
    pub category: C,
    /// Present only for explicit responses.
    pub rt_ms: Option<f64>,
    /// Adaptive parameters in effect while the stimulus was shown.
    pub params: P,
    /// Parameters the controller switched to after scoring this trial, if any.
    pub adjusted: Option<P>,
}

impl<S, A, C, P> TrialRecord<S, A, C, P> {
    pub fn responded(&self) -> bool {
        matches!(self.signal, Signal::Act(_))
    }

    /// Parameters in force once this trial was scored.
    pub fn params_after(&self) -> &P {
        self.adjusted.as_ref().unwrap_or(&self.params)
    }
}

/// Log entry type for a given task.
pub type TaskTrial<T> = TrialRecord<
    <T as TaskRules>::Stimulus,
    <T as TaskRules>::Action,
    <T as TaskRules>::Category,
    <T as TaskRules>::Params,
>;

/// The task-specific half of an engine: generator, classifier, adaptive
/// controller and metrics reducer.
pub trait TaskRules {
    type Stimulus: Clone + fmt::Debug;
    type Action: Copy + fmt::Debug;
    type Category: Copy + fmt::Debug + PartialEq;
    type Params: Clone + fmt::Debug + PartialEq;
    type Metrics: Clone + fmt::Debug;

    /// Identifier used in logs and summary records.
    const TASK_ID: &'static str;

    fn trial_budget(&self) -> usize;

    /// How many past stimuli the generator needs to see.
    fn history_depth(&self) -> usize {
        0
    }

    /// Return the adaptive state to its starting point.
    fn restart(&mut self, rng: &mut StdRng);

    /// Snapshot of the adaptive parameters currently in force.
    fn params(&self) -> Self::Params;

    fn generate(
        &self,
        id: u64,
        history: &VecDeque<Self::Stimulus>,
        rng: &mut StdRng,
    ) -> Self::Stimulus;

    fn classify(
        &self,
        stimulus: &Self::Stimulus,
        signal: &Signal<Self::Action>,
    ) -> Verdict<Self::Category>;

    /// Update the adaptive state from one outcome. Returns the new parameters
    /// when they changed.
    fn adapt(&mut self, verdict: &Verdict<Self::Category>, rng: &mut StdRng)
        -> Option<Self::Params>;

    /// Task-specific early termination (beyond the trial budget).
    fn goal_reached(&self) -> bool {
        false
    }

    fn reduce(&self, trials: &[TaskTrial<Self>]) -> Self::Metrics;
}

/// Result of [`TrialRunner::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome<S> {
    /// The next stimulus is on screen.
    Next(S),
    /// The run is finished; metrics are available.
    RunCompleted,
    /// Wrong phase, or the current trial has not been scored yet.
    Ignored,
}

#[derive(Debug, Clone)]
struct Scored<T: TaskRules> {
    signal: Signal<T::Action>,
    rt_ms: Option<f64>,
    verdict: Verdict<T::Category>,
    adjusted: Option<T::Params>,
}

#[derive(Debug, Clone)]
struct ActiveTrial<T: TaskRules> {
    index: usize,
    stimulus: T::Stimulus,
    presented_at: InstantStamp,
    params: T::Params,
    /// Set by the first signal; doubles as the consumed flag.
    scored: Option<Scored<T>>,
}

/// Generic engine driving one [`TaskRules`] implementation.
#[derive(Debug, Clone)]
pub struct TrialRunner<T: TaskRules> {
    rules: T,
    phase: Phase,
    run_id: u64,
    rng: StdRng,
    next_stimulus_id: u64,
    history: VecDeque<T::Stimulus>,
    active: Option<ActiveTrial<T>>,
    trials: Vec<TaskTrial<T>>,
    qc: QualityFlags,
}

impl<T: TaskRules> TrialRunner<T> {
    pub fn new(rules: T, seed: u64) -> Self {
        Self {
            rules,
            phase: Phase::Intro,
            run_id: 0,
            rng: StdRng::seed_from_u64(seed),
            next_stimulus_id: 0,
            history: VecDeque::new(),
            active: None,
            trials: Vec::new(),
            qc: QualityFlags::pristine(),
        }
    }

    /// Begin a run. Only valid from `intro`; returns the first stimulus.
    pub fn start(&mut self, at: InstantStamp) -> Option<T::Stimulus> {
        if self.phase != Phase::Intro {
            trace!(task = T::TASK_ID, phase = ?self.phase, "start ignored");
            return None;
        }

        self.clear_run_state();
        self.rules.restart(&mut self.rng);
        self.run_id = self.run_id.wrapping_add(1);
        self.phase = Phase::Playing;
        debug!(
            task = T::TASK_ID,
            run_id = self.run_id,
            budget = self.rules.trial_budget(),
            "run started"
        );

        Some(self.present(0, at))
    }

    /// Explicit response. Returns the verdict's correctness, or `None` when
    /// the engine is not awaiting a response for the current trial.
    pub fn respond(&mut self, action: T::Action, at: InstantStamp) -> Option<bool> {
        self.deliver(Signal::Act(action), Some(at))
    }

    /// Explicit decision not to respond.
    pub fn withhold(&mut self) -> Option<bool> {
        self.deliver(Signal::Withhold, None)
    }

    /// The display window for `trial_index` elapsed. Timers that fire for a
    /// trial that is no longer current are ignored.
    pub fn timeout(&mut self, trial_index: usize) -> Option<bool> {
        match &self.active {
            Some(active) if active.index == trial_index => self.deliver(Signal::Timeout, None),
            _ => {
                trace!(task = T::TASK_ID, trial_index, "stale timeout ignored");
                None
            }
        }
    }

    fn deliver(&mut self, signal: Signal<T::Action>, at: Option<InstantStamp>) -> Option<bool> {
        if self.phase != Phase::Playing {
            trace!(task = T::TASK_ID, ?signal, "signal outside playing ignored");
            return None;
        }
        let active = self.active.as_mut()?;
        if active.scored.is_some() {
            trace!(
                task = T::TASK_ID,
                trial = active.index,
                "trial already scored; signal ignored"
            );
            return None;
        }

        let verdict = self.rules.classify(&active.stimulus, &signal);
        let rt_ms = match (&signal, at) {
            (Signal::Act(_), Some(at)) => Some(at.millis_since(active.presented_at)),
            _ => None,
        };
        let adjusted = self.rules.adapt(&verdict, &mut self.rng);
        if let Some(params) = &adjusted {
            debug!(task = T::TASK_ID, trial = active.index, ?params, "adaptive parameters changed");
        }

        active.scored = Some(Scored {
            signal,
            rt_ms,
            verdict,
            adjusted,
        });
        Some(verdict.correct)
    }

    /// Commit the scored trial, then present the next stimulus or finish.
    pub fn advance(&mut self, at: InstantStamp) -> AdvanceOutcome<T::Stimulus> {
        if self.phase != Phase::Playing {
            return AdvanceOutcome::Ignored;
        }
        let (index, stimulus, params, scored) = match self.active.take() {
            Some(ActiveTrial {
                index,
                stimulus,
                params,
                scored: Some(scored),
                ..
            }) => (index, stimulus, params, scored),
            unscored => {
                if let Some(active) = &unscored {
                    trace!(task = T::TASK_ID, trial = active.index, "advance before response ignored");
                }
                self.active = unscored;
                return AdvanceOutcome::Ignored;
            }
        };

        self.trials.push(TrialRecord {
            index,
            stimulus: stimulus.clone(),
            signal: scored.signal,
            correct: scored.verdict.correct,
            category: scored.verdict.category,
            rt_ms: scored.rt_ms,
            params,
            adjusted: scored.adjusted,
        });
        self.remember(stimulus);

        let budget_spent = self.trials.len() >= self.rules.trial_budget();
        if budget_spent || self.rules.goal_reached() {
            self.phase = Phase::Result;
            self.qc.mark_min_trials(true);
            info!(
                task = T::TASK_ID,
                run_id = self.run_id,
                trials = self.trials.len(),
                goal_reached = !budget_spent,
                "run completed"
            );
            return AdvanceOutcome::RunCompleted;
        }

        let next_index = self.trials.len();
        AdvanceOutcome::Next(self.present(next_index, at))
    }

    /// Final metrics; `None` until the run reaches `result`.
    pub fn metrics(&self) -> Option<T::Metrics> {
        (self.phase == Phase::Result).then(|| self.rules.reduce(&self.trials))
    }

    /// Return to `intro`, discarding the current run.
    pub fn reset(&mut self) {
        if self.phase != Phase::Intro {
            debug!(task = T::TASK_ID, run_id = self.run_id, "run reset");
        }
        self.clear_run_state();
        self.phase = Phase::Intro;
    }

    pub fn log_focus_loss(&mut self) {
        self.qc.log_focus_loss();
    }

    pub fn log_visibility_blur(&mut self) {
        self.qc.log_visibility_blur();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn rules(&self) -> &T {
        &self.rules
    }

    pub fn trials(&self) -> &[TaskTrial<T>] {
        &self.trials
    }

    pub fn completed_trials(&self) -> usize {
        self.trials.len()
    }

    pub fn trial_budget(&self) -> usize {
        self.rules.trial_budget()
    }

    pub fn qc(&self) -> &QualityFlags {
        &self.qc
    }

    /// Stimulus currently on screen.
    pub fn current(&self) -> Option<&T::Stimulus> {
        self.active.as_ref().map(|active| &active.stimulus)
    }

    /// Index of the trial currently on screen.
    pub fn current_index(&self) -> Option<usize> {
        self.active.as_ref().map(|active| active.index)
    }

    /// Whether the current trial still accepts a signal.
    pub fn awaiting_response(&self) -> bool {
        self.phase == Phase::Playing
            && self
                .active
                .as_ref()
                .is_some_and(|active| active.scored.is_none())
    }

    /// Recently shown stimuli, oldest first, bounded by the task's history depth.
    pub fn history(&self) -> &VecDeque<T::Stimulus> {
        &self.history
    }

    fn present(&mut self, index: usize, at: InstantStamp) -> T::Stimulus {
        let id = self.next_stimulus_id;
        self.next_stimulus_id += 1;
        let stimulus = self.rules.generate(id, &self.history, &mut self.rng);
        trace!(task = T::TASK_ID, trial = index, ?stimulus, "stimulus presented");
        self.active = Some(ActiveTrial {
            index,
            stimulus: stimulus.clone(),
            presented_at: at,
            params: self.rules.params(),
            scored: None,
        });
        stimulus
    }

    fn remember(&mut self, stimulus: T::Stimulus) {
        let depth = self.rules.history_depth();
        if depth == 0 {
            return;
        }
        self.history.push_back(stimulus);
        while self.history.len() > depth {
            self.history.pop_front();
        }
    }

    fn clear_run_state(&mut self) {
        self.next_stimulus_id = 0;
        self.history.clear();
        self.active = None;
        self.trials.clear();
        self.qc = QualityFlags::pristine();
    }
}

impl<T> TrialRunner<T>
where
    T: TaskRules,
    T::Metrics: Serialize,
{
    /// Session record for a finished run, ready for the caller to persist.
    pub fn summary(&self) -> Option<Result<SummaryRecord, serde_json::Error>> {
        let metrics = self.metrics()?;
        Some(
            serde_json::to_value(&metrics)
                .map(|value| SummaryRecord::new(T::TASK_ID, value, self.qc.clone())),
        )
    }
}
