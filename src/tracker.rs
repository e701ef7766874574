//! Workout session state machine.
//!
//! [`SessionLog`] is the pure data side: per-exercise set logs, the
//! complete-means-locked rule and the completion percentage. Completing a set
//! yields a [`RestRequested`] instead of starting anything itself.
//!
//! [`WorkoutTracker`] pairs a session log with the single [`RestTimer`] and
//! owns the finish step: personal bests and the workout rotation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TrackerError;
use crate::models::{ExerciseLog, SetLog, WorkoutDay, WorkoutExercise};
use crate::records::{LiftMatching, PbUpdate, PersonalBests};
use crate::rest::{RestPolicy, RestRequested, RestTimer};
use crate::utils::parse_reps;

pub const DEFAULT_RPE: u8 = 8;
pub const MIN_RPE: u8 = 6;
pub const MAX_RPE: u8 = 10;

/// Partial edit of an unlocked set. `None` leaves the field alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SetUpdate {
    pub weight: Option<f32>,
    pub reps: Option<u32>,
    pub rpe: Option<u8>,
}

impl SetUpdate {
    fn validate(&self) -> Result<(), TrackerError> {
        if let Some(w) = self.weight {
            // Non-finite weights would serialize as JSON null.
            if !w.is_finite() || w < 0.0 {
                return Err(TrackerError::InvalidWeight(w));
            }
        }
        if self.reps == Some(0) {
            return Err(TrackerError::ZeroReps);
        }
        if let Some(rpe) = self.rpe {
            if !(MIN_RPE..=MAX_RPE).contains(&rpe) {
                return Err(TrackerError::RpeOutOfRange(rpe));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetToggled {
    pub completed: bool,
    /// Present only when the set became completed.
    pub rest: Option<RestRequested>,
}

fn initial_set(exercise: &WorkoutExercise, previous: &BTreeMap<String, f32>) -> SetLog {
    SetLog {
        weight: previous.get(&exercise.id).copied().unwrap_or(0.0),
        reps: parse_reps(&exercise.reps),
        rpe: match exercise.target_rpe {
            None | Some(0) => DEFAULT_RPE,
            Some(rpe) => rpe.clamp(MIN_RPE, MAX_RPE),
        },
        completed: false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    day: WorkoutDay,
    logs: Vec<ExerciseLog>,
}

impl SessionLog {
    /// One log per exercise with exactly `sets` entries, weights seeded from
    /// `previous` (exercise id -> last weight).
    pub fn new(day: WorkoutDay, previous: &BTreeMap<String, f32>) -> Self {
        let logs = day
            .exercises
            .iter()
            .map(|ex| ExerciseLog {
                exercise_id: ex.id.clone(),
                sets: vec![initial_set(ex, previous); ex.sets as usize],
            })
            .collect();
        Self { day, logs }
    }

    pub fn day(&self) -> &WorkoutDay {
        &self.day
    }

    pub fn logs(&self) -> &[ExerciseLog] {
        &self.logs
    }

    pub fn set(&self, exercise: usize, set: usize) -> Result<&SetLog, TrackerError> {
        let log = self.logs.get(exercise).ok_or(TrackerError::NoSuchExercise {
            index: exercise,
            len: self.logs.len(),
        })?;
        log.sets.get(set).ok_or(TrackerError::NoSuchSet {
            exercise,
            set,
            len: log.sets.len(),
        })
    }

    fn set_mut(&mut self, exercise: usize, set: usize) -> Result<&mut SetLog, TrackerError> {
        let len = self.logs.len();
        let log = self
            .logs
            .get_mut(exercise)
            .ok_or(TrackerError::NoSuchExercise { index: exercise, len })?;
        let len = log.sets.len();
        log.sets
            .get_mut(set)
            .ok_or(TrackerError::NoSuchSet { exercise, set, len })
    }

    pub fn edit_set(&mut self, exercise: usize, set: usize, update: SetUpdate) -> Result<(), TrackerError> {
        let target = self.set_mut(exercise, set)?;
        if target.completed {
            return Err(TrackerError::SetLocked { exercise, set });
        }
        update.validate()?;

        if let Some(w) = update.weight {
            target.weight = w;
        }
        if let Some(r) = update.reps {
            target.reps = r;
        }
        if let Some(r) = update.rpe {
            target.rpe = r;
        }
        debug!(exercise, set, ?update, "set edited");
        Ok(())
    }

    /// Flip completion of a set. Completing asks for a rest sized by `policy`.
    pub fn toggle_set(&mut self, exercise: usize, set: usize, policy: &RestPolicy) -> Result<SetToggled, TrackerError> {
        let is_warmup = self
            .day
            .exercises
            .get(exercise)
            .is_some_and(|ex| ex.is_warmup);
        let target = self.set_mut(exercise, set)?;
        target.completed = !target.completed;

        let completed = target.completed;
        let rest = completed.then(|| policy.request_for(is_warmup));
        debug!(exercise, set, completed, "set toggled");
        Ok(SetToggled { completed, rest })
    }

    pub fn total_sets(&self) -> usize {
        self.logs.iter().map(|l| l.sets.len()).sum()
    }

    pub fn completed_sets(&self) -> usize {
        self.logs.iter().map(ExerciseLog::completed_sets).sum()
    }

    /// Share of completed sets, 0-100. A plan without sets reports 0.
    pub fn completion_percent(&self) -> f32 {
        let total = self.total_sets().max(1);
        self.completed_sets() as f32 / total as f32 * 100.0
    }
}

/// Position in the client's workout split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    pub current: usize,
    pub split_len: usize,
}

impl Rotation {
    /// Wraps cyclically; an empty split stays at 0.
    pub fn next_index(&self) -> usize {
        if self.split_len == 0 {
            0
        } else {
            (self.current + 1) % self.split_len
        }
    }
}

/// Everything a finished session hands back to the caller for merging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishedSession {
    pub workout_id: String,
    pub logs: Vec<ExerciseLog>,
    pub next_workout_index: usize,
    pub completion: f32,
    pub pb_updates: Vec<PbUpdate>,
}

#[derive(Debug, Clone)]
pub struct WorkoutTracker {
    session: SessionLog,
    policy: RestPolicy,
    rest: RestTimer,
}

impl WorkoutTracker {
    pub fn new(day: WorkoutDay, previous: &BTreeMap<String, f32>, policy: RestPolicy) -> Self {
        Self::resume(SessionLog::new(day, previous), policy)
    }

    /// Continue a session from a previously saved log. The rest timer starts idle.
    pub fn resume(session: SessionLog, policy: RestPolicy) -> Self {
        Self {
            session,
            policy,
            rest: RestTimer::default(),
        }
    }

    pub fn session(&self) -> &SessionLog {
        &self.session
    }

    pub fn rest(&self) -> &RestTimer {
        &self.rest
    }

    pub fn rest_mut(&mut self) -> &mut RestTimer {
        &mut self.rest
    }

    pub fn edit_set(&mut self, exercise: usize, set: usize, update: SetUpdate) -> Result<(), TrackerError> {
        self.session.edit_set(exercise, set, update)
    }

    /// Toggle a set; completing one (re)starts the rest countdown.
    pub fn toggle_set(&mut self, exercise: usize, set: usize) -> Result<SetToggled, TrackerError> {
        let toggled = self.session.toggle_set(exercise, set, &self.policy)?;
        if let Some(request) = toggled.rest {
            self.rest.start(request);
        }
        Ok(toggled)
    }

    pub fn tick_rest(&mut self) -> Option<u32> {
        self.rest.tick()
    }

    pub fn cancel_rest(&mut self) {
        self.rest.cancel();
    }

    pub fn completion_percent(&self) -> f32 {
        self.session.completion_percent()
    }

    /// End the session. Partial sessions are allowed.
    ///
    /// For every exercise the heaviest weight over all its sets (completed or
    /// not) is offered to the matching ledger entry.
    pub fn finish(
        self,
        rotation: Rotation,
        ledger: &mut PersonalBests,
        matching: LiftMatching,
        date: NaiveDate,
    ) -> FinishedSession {
        let completion = self.session.completion_percent();
        let SessionLog { day, logs } = self.session;

        let mut pb_updates = Vec::new();
        for (exercise, log) in day.exercises.iter().zip(&logs) {
            let Some(lift) = ledger.resolve(exercise, matching).map(str::to_string) else {
                continue;
            };
            let weight = log.max_weight();
            if let Some(previous) = ledger.offer(&lift, weight, date) {
                info!(lift = %lift, previous, weight, "new personal best");
                pb_updates.push(PbUpdate {
                    lift,
                    exercise_id: exercise.id.clone(),
                    previous,
                    weight,
                    date,
                });
            }
        }

        FinishedSession {
            workout_id: day.id,
            logs,
            next_workout_index: rotation.next_index(),
            completion,
            pb_updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(id: &str, name: &str, sets: u32, reps: &str, rpe: Option<u8>, warmup: bool) -> WorkoutExercise {
        WorkoutExercise {
            id: id.into(),
            name: name.into(),
            sets,
            reps: reps.into(),
            target_rpe: rpe,
            tempo: None,
            notes: None,
            is_warmup: warmup,
            lift: None,
        }
    }

    fn push_day() -> WorkoutDay {
        WorkoutDay {
            id: "push-a".into(),
            day: "Monday".into(),
            title: "Push A".into(),
            exercises: vec![
                exercise("band", "Band Pull-Apart", 2, "15", None, true),
                exercise("bench", "Bench Press (Barbell)", 4, "8-10", Some(9), false),
                exercise("fly", "Cable Fly", 3, "AMRAP", None, false),
            ],
        }
    }

    fn progress() -> BTreeMap<String, f32> {
        BTreeMap::from([("bench".to_string(), 80.0)])
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[test]
    fn initialization_follows_plan() {
        let session = SessionLog::new(push_day(), &progress());
        let logs = session.logs();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs.iter().map(|l| l.sets.len()).collect::<Vec<_>>(), vec![2, 4, 3]);

        assert!(logs[1].sets.iter().all(|s| s.weight == 80.0 && s.reps == 8 && s.rpe == 9));
        assert!(logs[0].sets.iter().all(|s| s.weight == 0.0 && s.reps == 15 && s.rpe == 8));
        assert!(logs[2].sets.iter().all(|s| s.reps == 10 && !s.completed));
        assert_eq!(logs[1].exercise_id, "bench");
    }

    #[test]
    fn target_rpe_is_clamped() {
        let mut day = push_day();
        day.exercises[0].target_rpe = Some(4);
        day.exercises[2].target_rpe = Some(12);
        let session = SessionLog::new(day, &BTreeMap::new());
        assert_eq!(session.set(0, 0).unwrap().rpe, 6);
        assert_eq!(session.set(2, 0).unwrap().rpe, 10);
    }

    #[test]
    fn edit_changes_only_target_set() {
        let mut session = SessionLog::new(push_day(), &progress());
        let update = SetUpdate {
            weight: Some(82.5),
            reps: None,
            rpe: Some(10),
        };
        session.edit_set(1, 2, update).unwrap();

        let edited = session.set(1, 2).unwrap();
        assert_eq!((edited.weight, edited.reps, edited.rpe), (82.5, 8, 10));
        assert_eq!(session.set(1, 1).unwrap().weight, 80.0);
    }

    #[test]
    fn completed_set_is_locked() {
        let mut session = SessionLog::new(push_day(), &progress());
        let policy = RestPolicy::default();
        session.toggle_set(1, 0, &policy).unwrap();
        let before = *session.set(1, 0).unwrap();

        let err = session
            .edit_set(1, 0, SetUpdate { weight: Some(100.0), reps: Some(1), rpe: Some(10) })
            .unwrap_err();
        assert_eq!(err, TrackerError::SetLocked { exercise: 1, set: 0 });
        assert_eq!(*session.set(1, 0).unwrap(), before);

        // toggling back off unlocks it again
        let toggled = session.toggle_set(1, 0, &policy).unwrap();
        assert_eq!(toggled, SetToggled { completed: false, rest: None });
        session.edit_set(1, 0, SetUpdate { weight: Some(85.0), ..Default::default() }).unwrap();
        assert_eq!(session.set(1, 0).unwrap().weight, 85.0);
    }

    #[test]
    fn invalid_edits_leave_set_untouched() {
        let mut session = SessionLog::new(push_day(), &progress());
        let before = *session.set(1, 0).unwrap();

        let bad = [
            (SetUpdate { weight: Some(-5.0), ..Default::default() }, TrackerError::InvalidWeight(-5.0)),
            (
                SetUpdate { weight: Some(f32::INFINITY), ..Default::default() },
                TrackerError::InvalidWeight(f32::INFINITY),
            ),
            (SetUpdate { weight: Some(90.0), reps: Some(0), ..Default::default() }, TrackerError::ZeroReps),
            (SetUpdate { rpe: Some(11), ..Default::default() }, TrackerError::RpeOutOfRange(11)),
        ];
        for (update, expected) in bad {
            assert_eq!(session.edit_set(1, 0, update).unwrap_err(), expected);
        }
        assert_eq!(*session.set(1, 0).unwrap(), before);

        // NaN never compares equal, so it is checked on its own.
        let nan = SetUpdate { weight: Some(f32::NAN), ..Default::default() };
        assert!(matches!(session.edit_set(1, 0, nan), Err(TrackerError::InvalidWeight(w)) if w.is_nan()));
        assert_eq!(*session.set(1, 0).unwrap(), before);
    }

    #[test]
    fn rejected_weight_keeps_session_serializable() {
        let mut session = SessionLog::new(push_day(), &progress());
        let inf: f32 = "inf".parse().unwrap();
        assert!(session.edit_set(1, 0, SetUpdate { weight: Some(inf), ..Default::default() }).is_err());
        assert!(session.edit_set(1, 1, SetUpdate { weight: Some(f32::NEG_INFINITY), ..Default::default() }).is_err());

        let raw = serde_json::to_string(&session).unwrap();
        assert!(!raw.contains("\"weight\":null"));
        let back: SessionLog = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn out_of_range_indices_are_errors() {
        let mut session = SessionLog::new(push_day(), &progress());
        assert_eq!(
            session.edit_set(3, 0, SetUpdate::default()).unwrap_err(),
            TrackerError::NoSuchExercise { index: 3, len: 3 }
        );
        assert_eq!(
            session.toggle_set(0, 2, &RestPolicy::default()).unwrap_err(),
            TrackerError::NoSuchSet { exercise: 0, set: 2, len: 2 }
        );
        assert_eq!(session.completed_sets(), 0);
    }

    #[test]
    fn completion_percentage() {
        let day = WorkoutDay {
            id: "d".into(),
            day: "Tue".into(),
            title: "Ten sets".into(),
            exercises: vec![
                exercise("a", "A", 4, "5", None, false),
                exercise("b", "B", 6, "5", None, false),
            ],
        };
        let mut session = SessionLog::new(day, &BTreeMap::new());
        let policy = RestPolicy::default();
        for (ex, set) in [(0, 0), (0, 1), (1, 5)] {
            session.toggle_set(ex, set, &policy).unwrap();
        }
        assert_eq!(session.total_sets(), 10);
        assert!((session.completion_percent() - 30.0).abs() < f32::EPSILON);
    }

    #[test]
    fn completion_of_empty_plan_is_zero() {
        let day = WorkoutDay {
            id: "empty".into(),
            day: "Sun".into(),
            title: "Nothing".into(),
            exercises: vec![exercise("a", "A", 0, "5", None, false)],
        };
        let session = SessionLog::new(day, &BTreeMap::new());
        assert_eq!(session.total_sets(), 0);
        assert_eq!(session.completion_percent(), 0.0);
    }

    #[test]
    fn completing_starts_rest_by_exercise_kind() {
        let mut tracker = WorkoutTracker::new(push_day(), &progress(), RestPolicy::default());

        let warmup = tracker.toggle_set(0, 0).unwrap();
        assert_eq!(warmup.rest, Some(RestRequested { seconds: 15 }));
        assert_eq!(tracker.rest().remaining(), 15);

        tracker.tick_rest();
        let working = tracker.toggle_set(1, 0).unwrap();
        assert_eq!(working.rest, Some(RestRequested { seconds: 90 }));
        // overwrites the warm-up countdown rather than queueing
        assert_eq!(tracker.rest().remaining(), 90);
        assert!(tracker.rest().is_active());
    }

    #[test]
    fn uncompleting_leaves_timer_alone() {
        let mut tracker = WorkoutTracker::new(push_day(), &progress(), RestPolicy::default());
        tracker.toggle_set(1, 0).unwrap();
        tracker.tick_rest();
        tracker.toggle_set(1, 0).unwrap();
        assert!(tracker.rest().is_active());
        assert_eq!(tracker.rest().remaining(), 89);
    }

    #[test]
    fn cancelled_rest_does_not_tick() {
        let mut tracker = WorkoutTracker::new(push_day(), &progress(), RestPolicy::default());
        tracker.toggle_set(1, 0).unwrap();
        tracker.cancel_rest();
        assert!(!tracker.rest().is_active());
        assert_eq!(tracker.tick_rest(), None);
    }

    #[test]
    fn custom_policy_durations() {
        let policy = RestPolicy { warmup_secs: 10, working_secs: 60 };
        let mut tracker = WorkoutTracker::new(push_day(), &progress(), policy);
        assert_eq!(tracker.toggle_set(2, 0).unwrap().rest, Some(RestRequested { seconds: 60 }));
    }

    #[test]
    fn rotation_wraps() {
        assert_eq!(Rotation { current: 3, split_len: 4 }.next_index(), 0);
        assert_eq!(Rotation { current: 1, split_len: 4 }.next_index(), 2);
        assert_eq!(Rotation { current: 0, split_len: 0 }.next_index(), 0);
    }

    #[test]
    fn finish_updates_personal_best() {
        let mut ledger = PersonalBests::seeded();
        ledger.offer("Bench Press", 80.0, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());

        let mut tracker = WorkoutTracker::new(push_day(), &progress(), RestPolicy::default());
        tracker.edit_set(1, 3, SetUpdate { weight: Some(85.0), ..Default::default() }).unwrap();

        let finished = tracker.finish(Rotation { current: 3, split_len: 4 }, &mut ledger, LiftMatching::Fuzzy, date());

        let pb = ledger.get("Bench Press").unwrap();
        assert_eq!(pb.weight, 85.0);
        assert_eq!(pb.date, Some(date()));
        assert_eq!(pb.history.last().map(|e| (e.weight, e.date)), Some((85.0, date())));
        assert_eq!(finished.pb_updates.len(), 1);
        assert_eq!(finished.pb_updates[0].previous, 80.0);
        assert_eq!(finished.next_workout_index, 0);
    }

    #[test]
    fn lighter_session_leaves_ledger_unchanged() {
        let mut ledger = PersonalBests::seeded();
        ledger.offer("Bench Press", 80.0, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let before = ledger.clone();

        let mut tracker = WorkoutTracker::new(push_day(), &BTreeMap::new(), RestPolicy::default());
        for set in 0..4 {
            tracker.edit_set(1, set, SetUpdate { weight: Some(75.0), ..Default::default() }).unwrap();
        }
        let finished = tracker.finish(Rotation { current: 0, split_len: 4 }, &mut ledger, LiftMatching::Fuzzy, date());

        assert_eq!(ledger, before);
        assert!(finished.pb_updates.is_empty());
    }

    #[test]
    fn finish_without_full_completion_emits_everything() {
        let mut tracker = WorkoutTracker::new(push_day(), &progress(), RestPolicy::default());
        tracker.toggle_set(0, 0).unwrap();
        let mut ledger = PersonalBests::seeded();

        let finished = tracker.finish(Rotation { current: 0, split_len: 2 }, &mut ledger, LiftMatching::Tagged, date());

        assert_eq!(finished.workout_id, "push-a");
        assert_eq!(finished.logs.len(), 3);
        assert_eq!(finished.logs.iter().map(|l| l.sets.len()).sum::<usize>(), 9);
        assert!(finished.completion > 0.0 && finished.completion < 100.0);
        // tagged matching with no tags: nothing counts towards the ledger
        assert!(finished.pb_updates.is_empty());
        assert_eq!(finished.next_workout_index, 1);
    }

    #[test]
    fn session_log_survives_serialization() {
        let mut session = SessionLog::new(push_day(), &progress());
        session.toggle_set(1, 1, &RestPolicy::default()).unwrap();
        let json = serde_json::to_string(&session).unwrap();
        let back: SessionLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
