use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::PersonalBests;
use crate::tracker::FinishedSession;

/// One movement inside a workout day, as prescribed by the plan.
/// Read-only for the duration of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub id: String,
    pub name: String,
    pub sets: u32,
    /// Rep descriptor, e.g. "8-10", "12" or "AMRAP".
    pub reps: String,
    #[serde(default)]
    pub target_rpe: Option<u8>,
    #[serde(default)]
    pub tempo: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_warmup: bool,
    /// Explicit canonical lift this exercise counts towards for personal bests.
    #[serde(default)]
    pub lift: Option<String>,
}

/// One day of a workout split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub id: String,
    pub day: String,
    pub title: String,
    pub exercises: Vec<WorkoutExercise>,
}

impl WorkoutDay {
    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.sets).sum()
    }
}

/// A single planned or performed set.
/// Once `completed` is set the other fields are locked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetLog {
    pub weight: f32,
    pub reps: u32,
    pub rpe: u8,
    pub completed: bool,
}

/// Every set logged against one exercise in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
    pub exercise_id: String,
    pub sets: Vec<SetLog>,
}

impl ExerciseLog {
    /// Heaviest weight across all sets, completed or not.
    pub fn max_weight(&self) -> f32 {
        self.sets.iter().map(|s| s.weight).fold(0.0, f32::max)
    }

    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }
}

/// What happened on a given day for a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    pub date: NaiveDate,
    pub workout_completed: bool,
    #[serde(default)]
    pub workout_id: Option<String>,
    #[serde(default)]
    pub exercise_logs: Vec<ExerciseLog>,
    /// Share of sets completed when the session was finished (0-100).
    #[serde(default)]
    pub completion: f32,
}

/// The persistent aggregate for one coached client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Local>,
    #[serde(default)]
    pub current_workout_index: usize,
    /// Exercise id -> last working weight.
    #[serde(default)]
    pub exercise_progress: BTreeMap<String, f32>,
    #[serde(default)]
    pub workout_split: Vec<WorkoutDay>,
    #[serde(default)]
    pub personal_bests: PersonalBests,
    #[serde(default)]
    pub logs: Vec<DailyLog>,
}

impl ClientRecord {
    pub fn new(name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: format!("client_{}", Uuid::new_v4().simple()),
            name: name.into(),
            email,
            created_at: Local::now(),
            current_workout_index: 0,
            exercise_progress: BTreeMap::new(),
            workout_split: Vec::new(),
            personal_bests: PersonalBests::seeded(),
            logs: Vec::new(),
        }
    }

    /// The day that is up next in the rotation, if the client has a plan.
    pub fn next_workout(&self) -> Option<&WorkoutDay> {
        self.workout_split.get(self.current_workout_index)
    }

    /// Replace the workout split and restart the rotation.
    pub fn assign_plan(&mut self, split: Vec<WorkoutDay>) {
        self.workout_split = split;
        self.current_workout_index = 0;
    }

    /// Merge a finished session into the record.
    ///
    /// Personal bests are already updated by the tracker; this advances the
    /// rotation, carries the heaviest weight per exercise forward as the next
    /// session's starting weight, and appends the day's log.
    pub fn record_workout(&mut self, finished: &FinishedSession, date: NaiveDate) {
        self.current_workout_index = finished.next_workout_index;

        for log in &finished.logs {
            let max = log.max_weight();
            if max > 0.0 {
                self.exercise_progress.insert(log.exercise_id.clone(), max);
            }
        }

        self.logs.push(DailyLog {
            date,
            workout_completed: true,
            workout_id: Some(finished.workout_id.clone()),
            exercise_logs: finished.logs.clone(),
            completion: finished.completion,
        });
    }

    pub fn sessions_completed(&self) -> usize {
        self.logs.iter().filter(|l| l.workout_completed).count()
    }
}
