use thiserror::Error;

/// Rejected session operations. The session state is unchanged whenever one
/// of these is returned.
#[derive(Debug, Error, PartialEq)]
pub enum TrackerError {
    #[error("no exercise at index {index} (session has {len})")]
    NoSuchExercise { index: usize, len: usize },

    #[error("no set {set} for exercise {exercise} (exercise has {len})")]
    NoSuchSet {
        exercise: usize,
        set: usize,
        len: usize,
    },

    #[error("set {set} of exercise {exercise} is completed and locked")]
    SetLocked { exercise: usize, set: usize },

    #[error("weight must be a finite number of kg, 0 or more (got {0})")]
    InvalidWeight(f32),

    #[error("reps must be at least 1")]
    ZeroReps,

    #[error("RPE must be between 6 and 10 (got {0})")]
    RpeOutOfRange(u8),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("client `{0}` not found")]
    ClientNotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt record: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Reasons a workout split file is rejected.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid plan file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("plan has no [[days]]")]
    NoDays,

    #[error("day `{0}` has no exercises")]
    EmptyDay(String),

    #[error("exercise name must not be empty (day `{0}`)")]
    EmptyName(String),

    #[error("`{exercise}` in day `{day}` needs at least one set")]
    ZeroSets { day: String, exercise: String },

    #[error("day `{day}` lists exercise id `{id}` more than once")]
    DuplicateExercise { day: String, id: String },
}
