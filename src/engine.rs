use crate::plan::{PlanError, SessionPlan};

/// Boundary notifications returned by the engine. The event loop consumes
/// these immediately: `SessionEnded` triggers the audible cue,
/// `TrainingCompleted` the celebration and run log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    SessionStarted { session: u32, total: u32 },
    SessionEnded { session: u32 },
    TrainingCompleted,
    TrainingStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Running,
    /// Terminal phase after the last session's countdown hit zero. Observable
    /// state is identical to `Idle` (session 0, nothing remaining, not
    /// running); the distinction only keeps the aggregate projections at
    /// "plan finished" until the next start or stop.
    Completed,
}

/// The countdown/session state machine. Owns the current session index, the
/// remaining time and the running flag; knows nothing about clocks, threads
/// or rendering. Callers drive it through `tick` with measured elapsed
/// seconds and serialize all calls on one thread of control.
#[derive(Debug, Default)]
pub struct CountdownEngine {
    plan: Option<SessionPlan>,
    current_session: u32,
    remaining_secs: u64,
    phase: Phase,
}

impl CountdownEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a plan and begin its first session.
    ///
    /// Plans are validated at construction, but the empty-name check is
    /// repeated here so a start against a hand-rolled plan can never leave
    /// the engine half-configured.
    pub fn start(&mut self, plan: SessionPlan) -> Result<EngineEvent, PlanError> {
        plan.validate()?;
        self.current_session = 1;
        self.remaining_secs = plan.session_duration_secs();
        self.phase = Phase::Running;
        let total = plan.total_sessions();
        self.plan = Some(plan);
        Ok(EngineEvent::SessionStarted { session: 1, total })
    }

    /// Advance the countdown by `elapsed_secs`. Ignored unless running.
    ///
    /// When the remaining time reaches zero the session boundary fires: the
    /// next session starts at its full configured duration (elapsed time
    /// beyond the boundary is discarded, so a coarse clock never leaks time
    /// from one session into the next), or, after the final session, the
    /// engine returns to idle with a `TrainingCompleted` event.
    pub fn tick(&mut self, elapsed_secs: u64) -> Vec<EngineEvent> {
        if self.phase != Phase::Running {
            return Vec::new();
        }
        let Some(plan) = &self.plan else {
            return Vec::new();
        };
        let (total, duration) = (plan.total_sessions(), plan.session_duration_secs());

        self.remaining_secs = self.remaining_secs.saturating_sub(elapsed_secs);
        if self.remaining_secs > 0 {
            return Vec::new();
        }

        let ended = self.current_session;
        let mut events = vec![EngineEvent::SessionEnded { session: ended }];
        if ended < total {
            self.current_session = ended + 1;
            self.remaining_secs = duration;
            events.push(EngineEvent::SessionStarted {
                session: self.current_session,
                total,
            });
        } else {
            self.current_session = 0;
            self.phase = Phase::Completed;
            events.push(EngineEvent::TrainingCompleted);
        }
        events
    }

    /// Abort the run and return to idle. Safe to call in any phase; the
    /// event is only produced when a countdown was actually in progress.
    pub fn stop(&mut self) -> Option<EngineEvent> {
        let was_running = self.phase == Phase::Running;
        self.current_session = 0;
        self.remaining_secs = 0;
        self.phase = Phase::Idle;
        was_running.then_some(EngineEvent::TrainingStopped)
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_completed(&self) -> bool {
        self.phase == Phase::Completed
    }

    /// 0 when idle, otherwise 1-based index of the session counting down.
    pub fn current_session(&self) -> u32 {
        self.current_session
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// The plan loaded by the last `start`, kept for display and restarts.
    pub fn plan(&self) -> Option<&SessionPlan> {
        self.plan.as_ref()
    }

    /// Remaining time in the current session as `mm:ss`.
    pub fn remaining_formatted(&self) -> String {
        format_mmss(self.remaining_secs)
    }

    /// Seconds left in the whole plan: the current session's remainder plus
    /// every session not yet begun.
    pub fn total_remaining(&self) -> u64 {
        match (&self.plan, self.phase) {
            (Some(_), Phase::Completed) => 0,
            (Some(plan), _) => {
                let sessions_left = u64::from(plan.total_sessions() - self.current_session);
                self.remaining_secs + sessions_left * plan.session_duration_secs()
            }
            (None, _) => 0,
        }
    }

    /// How much of the whole plan has elapsed, in percent. 0 with no plan
    /// loaded (a zero-length plan cannot be constructed, but the projection
    /// must never divide by zero).
    pub fn progress_percent(&self) -> f64 {
        let Some(plan) = &self.plan else {
            return 0.0;
        };
        let planned = plan.total_planned_secs();
        if planned == 0 {
            return 0.0;
        }
        100.0 * (planned - self.total_remaining()) as f64 / planned as f64
    }
}

/// Zero-padded `mm:ss` rendering used for both the per-session countdown and
/// the whole-plan aggregate.
pub fn format_mmss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn plan(sessions: u32, duration: u64) -> SessionPlan {
        SessionPlan::new("drill", sessions, duration).unwrap()
    }

    #[test]
    fn new_engine_is_idle() {
        let engine = CountdownEngine::new();
        assert!(!engine.is_running());
        assert_eq!(engine.current_session(), 0);
        assert_eq!(engine.remaining_secs(), 0);
    }

    #[test]
    fn start_enters_first_session() {
        let mut engine = CountdownEngine::new();
        let ev = engine.start(plan(4, 30)).unwrap();
        assert_eq!(ev, EngineEvent::SessionStarted { session: 1, total: 4 });
        assert!(engine.is_running());
        assert_eq!(engine.current_session(), 1);
        assert_eq!(engine.remaining_secs(), 30);
    }

    #[test]
    fn tick_while_idle_is_ignored() {
        let mut engine = CountdownEngine::new();
        assert!(engine.tick(10).is_empty());
        assert_eq!(engine.remaining_secs(), 0);
        assert!(!engine.is_running());
    }

    #[test]
    fn tick_decrements_without_boundary_events() {
        let mut engine = CountdownEngine::new();
        engine.start(plan(2, 5)).unwrap();
        assert!(engine.tick(1).is_empty());
        assert!(engine.tick(1).is_empty());
        assert_eq!(engine.remaining_secs(), 3);
        assert_eq!(engine.current_session(), 1);
    }

    #[test]
    fn session_boundary_advances_and_restores_full_duration() {
        let mut engine = CountdownEngine::new();
        engine.start(plan(2, 3)).unwrap();
        engine.tick(1);
        engine.tick(1);
        let events = engine.tick(1);
        assert_eq!(
            events,
            vec![
                EngineEvent::SessionEnded { session: 1 },
                EngineEvent::SessionStarted { session: 2, total: 2 },
            ]
        );
        assert!(engine.is_running());
        assert_eq!(engine.current_session(), 2);
        assert_eq!(engine.remaining_secs(), 3);
    }

    #[test]
    fn two_by_three_scenario_runs_to_completion() {
        let mut engine = CountdownEngine::new();
        let ev = engine
            .start(SessionPlan::new("A", 2, 3).unwrap())
            .unwrap();
        assert_eq!(ev, EngineEvent::SessionStarted { session: 1, total: 2 });
        assert_eq!(engine.remaining_secs(), 3);

        for _ in 0..2 {
            assert!(engine.tick(1).is_empty());
        }
        let boundary = engine.tick(1);
        assert_matches!(boundary[0], EngineEvent::SessionEnded { session: 1 });
        assert_matches!(
            boundary[1],
            EngineEvent::SessionStarted { session: 2, total: 2 }
        );

        for _ in 0..2 {
            assert!(engine.tick(1).is_empty());
        }
        let last = engine.tick(1);
        assert_eq!(
            last,
            vec![
                EngineEvent::SessionEnded { session: 2 },
                EngineEvent::TrainingCompleted,
            ]
        );
        assert!(!engine.is_running());
        assert_eq!(engine.current_session(), 0);
        assert_eq!(engine.remaining_secs(), 0);
    }

    #[test]
    fn completion_fires_exactly_once_over_full_plan() {
        let mut engine = CountdownEngine::new();
        engine.start(plan(3, 4)).unwrap();

        let mut completions = 0;
        for _ in 0..12 {
            for ev in engine.tick(1) {
                if ev == EngineEvent::TrainingCompleted {
                    completions += 1;
                }
            }
        }
        assert_eq!(completions, 1);
        assert!(!engine.is_running());
        // Further ticks change nothing.
        assert!(engine.tick(1).is_empty());
        assert_eq!(completions, 1);
    }

    #[test]
    fn oversized_tick_clamps_and_does_not_leak_into_next_session() {
        let mut engine = CountdownEngine::new();
        engine.start(plan(2, 30)).unwrap();
        engine.tick(27);
        assert_eq!(engine.remaining_secs(), 3);

        // 5 elapsed seconds against 3 remaining: the boundary fires and the
        // 2 excess seconds are discarded.
        let events = engine.tick(5);
        assert_matches!(events[0], EngineEvent::SessionEnded { session: 1 });
        assert_eq!(engine.current_session(), 2);
        assert_eq!(engine.remaining_secs(), 30);
    }

    #[test]
    fn stop_returns_to_idle_and_is_idempotent() {
        let mut engine = CountdownEngine::new();
        engine.start(plan(4, 30)).unwrap();
        engine.tick(7);

        assert_eq!(engine.stop(), Some(EngineEvent::TrainingStopped));
        assert!(!engine.is_running());
        assert_eq!(engine.current_session(), 0);
        assert_eq!(engine.remaining_secs(), 0);

        // Second stop: same idle state, no event.
        assert_eq!(engine.stop(), None);
        assert!(!engine.is_running());
        assert_eq!(engine.current_session(), 0);
        assert_eq!(engine.remaining_secs(), 0);
    }

    #[test]
    fn stop_before_start_is_a_silent_noop() {
        let mut engine = CountdownEngine::new();
        assert_eq!(engine.stop(), None);
        assert_eq!(engine.current_session(), 0);
    }

    #[test]
    fn empty_name_never_leaves_idle() {
        let engine = CountdownEngine::new();
        // An empty name is rejected before a plan ever reaches the engine.
        assert_eq!(SessionPlan::new("", 2, 3), Err(PlanError::EmptyName));
        assert_eq!(SessionPlan::new("   ", 2, 3), Err(PlanError::EmptyName));
        assert!(!engine.is_running());
        assert_eq!(engine.current_session(), 0);
        assert_eq!(engine.remaining_secs(), 0);
    }

    #[test]
    fn remaining_formatted_is_zero_padded_mmss() {
        let mut engine = CountdownEngine::new();
        assert_eq!(engine.remaining_formatted(), "00:00");
        engine.start(plan(1, 125)).unwrap();
        assert_eq!(engine.remaining_formatted(), "02:05");
        engine.tick(116);
        assert_eq!(engine.remaining_formatted(), "00:09");
    }

    #[test]
    fn format_mmss_is_five_chars_below_an_hour() {
        for secs in [0, 1, 59, 60, 61, 599, 600, 3599] {
            let s = format_mmss(secs);
            assert_eq!(s.len(), 5, "{s:?}");
            assert_eq!(s.as_bytes()[2], b':');
        }
        assert_eq!(format_mmss(3599), "59:59");
    }

    #[test]
    fn total_remaining_covers_unstarted_sessions() {
        let mut engine = CountdownEngine::new();
        assert_eq!(engine.total_remaining(), 0);

        engine.start(plan(4, 30)).unwrap();
        assert_eq!(engine.total_remaining(), 120);
        engine.tick(10);
        assert_eq!(engine.total_remaining(), 110);

        // Cross into session 2: 30 remaining there plus two whole sessions.
        engine.tick(20);
        assert_eq!(engine.total_remaining(), 90);
    }

    #[test]
    fn progress_is_monotonic_and_hits_one_hundred() {
        let mut engine = CountdownEngine::new();
        engine.start(plan(2, 3)).unwrap();
        assert_eq!(engine.progress_percent(), 0.0);

        let mut previous = 0.0;
        let mut completed = false;
        for _ in 0..6 {
            for ev in engine.tick(1) {
                if ev == EngineEvent::TrainingCompleted {
                    completed = true;
                }
            }
            let now = engine.progress_percent();
            assert!(now >= previous, "{now} < {previous}");
            previous = now;
        }
        assert!(completed);
        assert_eq!(engine.progress_percent(), 100.0);
    }

    #[test]
    fn progress_resets_with_the_next_start() {
        let mut engine = CountdownEngine::new();
        engine.start(plan(1, 2)).unwrap();
        engine.tick(2);
        assert_eq!(engine.progress_percent(), 100.0);

        engine.start(plan(1, 2)).unwrap();
        assert_eq!(engine.progress_percent(), 0.0);
        assert!(engine.is_running());
    }

    #[test]
    fn stop_clears_the_completed_projection() {
        let mut engine = CountdownEngine::new();
        engine.start(plan(1, 1)).unwrap();
        engine.tick(1);
        assert!(engine.is_completed());
        let _ = engine.stop();
        assert!(!engine.is_completed());
        // Back to the idle projection: the untouched plan's full length.
        assert_eq!(engine.total_remaining(), 1);
    }
}
