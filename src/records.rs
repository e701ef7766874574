//! Personal-best ledger.
//!
//! Each entry tracks a canonical lift ("Bench Press", "Squat", ...) with its
//! current best weight and an append-only history of previous records.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::models::WorkoutExercise;

/// Lifts every new client starts out tracking.
pub static CANONICAL_LIFTS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["Bench Press", "Squat", "Deadlift", "Shoulder Press"]);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PbEntry {
    pub weight: f32,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalBest {
    pub exercise: String,
    pub weight: f32,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub history: Vec<PbEntry>,
}

impl PersonalBest {
    fn new(lift: &str) -> Self {
        Self {
            exercise: lift.to_string(),
            weight: 0.0,
            date: None,
            history: Vec::new(),
        }
    }

    /// Last `n` records, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &PbEntry> {
        self.history.iter().rev().take(n)
    }
}

/// How a session exercise is matched to a ledger entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LiftMatching {
    /// Either name contains the other, case-insensitive. First entry wins.
    /// Loose: "Press" would match several lifts.
    #[default]
    Fuzzy,
    /// Only the exercise's explicit `lift` tag counts.
    Tagged,
}

impl FromStr for LiftMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fuzzy" => Ok(Self::Fuzzy),
            "tagged" => Ok(Self::Tagged),
            other => Err(format!("unknown lift matching mode `{other}` (expected fuzzy or tagged)")),
        }
    }
}

impl Display for LiftMatching {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fuzzy => write!(f, "fuzzy"),
            Self::Tagged => write!(f, "tagged"),
        }
    }
}

/// A record that was beaten when a session finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PbUpdate {
    pub lift: String,
    pub exercise_id: String,
    pub previous: f32,
    pub weight: f32,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonalBests {
    entries: Vec<PersonalBest>,
}

impl PersonalBests {
    pub fn seeded() -> Self {
        Self {
            entries: CANONICAL_LIFTS.iter().map(|l| PersonalBest::new(l)).collect(),
        }
    }

    pub fn entries(&self) -> &[PersonalBest] {
        &self.entries
    }

    pub fn get(&self, lift: &str) -> Option<&PersonalBest> {
        self.entries
            .iter()
            .find(|pb| pb.exercise.eq_ignore_ascii_case(lift))
    }

    /// Start tracking `lift`. Returns false when it is already tracked.
    pub fn track(&mut self, lift: &str) -> bool {
        let lift = lift.trim();
        if lift.is_empty() || self.get(lift).is_some() {
            return false;
        }
        self.entries.push(PersonalBest::new(lift));
        true
    }

    /// Name of the ledger entry `exercise` counts towards, if any.
    pub fn resolve(&self, exercise: &WorkoutExercise, matching: LiftMatching) -> Option<&str> {
        if let Some(tag) = &exercise.lift {
            return self.get(tag).map(|pb| pb.exercise.as_str());
        }
        match matching {
            LiftMatching::Tagged => None,
            LiftMatching::Fuzzy => {
                let name = exercise.name.to_lowercase();
                self.entries
                    .iter()
                    .find(|pb| {
                        let lift = pb.exercise.to_lowercase();
                        name.contains(&lift) || lift.contains(&name)
                    })
                    .map(|pb| pb.exercise.as_str())
            }
        }
    }

    /// Record `weight` for `lift` if it strictly beats the current best.
    /// Returns the previous best when the ledger changed.
    pub fn offer(&mut self, lift: &str, weight: f32, date: NaiveDate) -> Option<f32> {
        let pb = self
            .entries
            .iter_mut()
            .find(|pb| pb.exercise.eq_ignore_ascii_case(lift))?;
        if weight <= pb.weight {
            return None;
        }
        let previous = pb.weight;
        pb.weight = weight;
        pb.date = Some(date);
        pb.history.push(PbEntry { weight, date });
        Some(previous)
    }

    /// Closest tracked lift to `input`, when it is clearly the best candidate.
    pub fn suggest(&self, input: &str) -> Option<&str> {
        best_suggestion(input, self.entries.iter().map(|pb| pb.exercise.as_str()))
    }
}

/// Return the closest candidate for `input` if similarity ≥ 0.80 *and*
/// clearly better than the runner-up.
pub fn best_suggestion<'a, I>(input: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    let inp = input.to_lowercase();
    let mut scores: Vec<(&'a str, f64)> = candidates
        .into_iter()
        .map(|c| (c, jaro_winkler(&inp, &c.to_lowercase())))
        .collect();
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (best, best_score) = *scores.first()?;
    let second_score = scores.get(1).map_or(0.0, |(_, s)| *s);

    if best_score >= MIN_SCORE && best_score - second_score >= GAP {
        Some(best)
    } else {
        None
    }
}
