use std::collections::HashSet;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Deserialize;

use crate::{
    cli::PlanCmd,
    commands::Ctx,
    error::PlanError,
    models::{WorkoutDay, WorkoutExercise},
    storage::ClientRepository,
    types::emit,
    utils::slugify,
};

#[derive(Debug, Deserialize)]
struct PlanToml {
    #[serde(default)]
    days: Vec<DayToml>,
}

#[derive(Debug, Deserialize)]
struct DayToml {
    id: Option<String>,
    day: String,
    title: String,
    #[serde(default)]
    exercises: Vec<ExerciseToml>,
}

#[derive(Debug, Deserialize)]
struct ExerciseToml {
    id: Option<String>,
    name: String,
    sets: u32,
    reps: Option<String>,
    target_rpe: Option<u8>,
    tempo: Option<String>,
    notes: Option<String>,
    #[serde(default)]
    warmup: bool,
    lift: Option<String>,
}

/// Parse and validate a workout split.
///
/// Missing ids fall back to slugs of the exercise name / day title, so the
/// same exercise keeps its progress across days.
pub fn parse_plan(raw: &str) -> Result<Vec<WorkoutDay>, PlanError> {
    let plan: PlanToml = toml::from_str(raw)?;
    if plan.days.is_empty() {
        return Err(PlanError::NoDays);
    }

    let mut split = Vec::with_capacity(plan.days.len());
    for day in plan.days {
        if day.exercises.is_empty() {
            return Err(PlanError::EmptyDay(day.title));
        }

        let mut seen = HashSet::new();
        let mut exercises = Vec::with_capacity(day.exercises.len());
        for ex in day.exercises {
            let name = ex.name.trim().to_string();
            if name.is_empty() {
                return Err(PlanError::EmptyName(day.title));
            }
            if ex.sets == 0 {
                return Err(PlanError::ZeroSets { day: day.title, exercise: name });
            }
            let id = ex.id.unwrap_or_else(|| slugify(&name));
            if !seen.insert(id.clone()) {
                return Err(PlanError::DuplicateExercise { day: day.title, id });
            }
            exercises.push(WorkoutExercise {
                id,
                name,
                sets: ex.sets,
                reps: ex.reps.unwrap_or_else(|| "10".to_string()),
                target_rpe: ex.target_rpe,
                tempo: ex.tempo,
                notes: ex.notes,
                is_warmup: ex.warmup,
                lift: ex.lift,
            });
        }

        split.push(WorkoutDay {
            id: day.id.unwrap_or_else(|| slugify(&day.title)),
            day: day.day,
            title: day.title,
            exercises,
        });
    }

    Ok(split)
}

pub async fn handle(cmd: PlanCmd, ctx: &Ctx) -> Result<()> {
    match cmd {
        PlanCmd::Import { file, client } => {
            let Some(mut client) = ctx.client(client.as_deref()).await? else {
                return Ok(());
            };

            let raw = match tokio::fs::read_to_string(&file).await {
                Ok(s) => s,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    println!("{} cannot open file `{}` – file not found", "error:".red().bold(), file);
                    return Ok(());
                }
                Err(e) => return Err(e).with_context(|| format!("reading `{file}`")),
            };

            let split = match parse_plan(&raw) {
                Ok(split) => split,
                Err(e) => {
                    println!("{} cannot import `{}` – {}", "error:".red().bold(), file, e);
                    return Ok(());
                }
            };

            for ex in split.iter().flat_map(|d| &d.exercises) {
                let Some(lift) = &ex.lift else { continue };
                if client.personal_bests.get(lift).is_none() {
                    print!(
                        "{} `{}` is tagged with untracked lift `{}`",
                        "warning:".yellow().bold(),
                        ex.name,
                        lift
                    );
                    match client.personal_bests.suggest(lift) {
                        Some(s) => println!(" – did you mean `{}`?", s.green()),
                        None => println!(" – add it with `pb track`"),
                    }
                }
            }

            if ctx.store.load_active(&client.id).await?.is_some() {
                println!(
                    "{} {} has a session in progress; it keeps the old plan's exercises",
                    "note:".yellow().bold(),
                    client.name
                );
            }

            let days = split.len();
            client.assign_plan(split);
            ctx.store.save(&client).await?;
            println!(
                "{} imported {} day split for {}",
                "ok:".green().bold(),
                days,
                client.name.bold()
            );
        }

        PlanCmd::Show { client } => {
            let Some(client) = ctx.client(client.as_deref()).await? else {
                return Ok(());
            };
            emit(ctx.fmt, &client.workout_split, || {
                if client.workout_split.is_empty() {
                    println!("{}", "  (no plan assigned)".dimmed());
                    return;
                }
                println!("{} {}", "Plan:".cyan().bold(), client.name.bold());
                for (i, day) in client.workout_split.iter().enumerate() {
                    let pointer = if i == client.current_workout_index { "→".green().bold().to_string() } else { " ".to_string() };
                    println!(
                        "{} {} • {} {}",
                        pointer,
                        (i + 1).to_string().yellow(),
                        day.title.bold(),
                        format!("({})", day.day).dimmed()
                    );
                    let n = day.exercises.len();
                    for (j, ex) in day.exercises.iter().enumerate() {
                        let connector = if j + 1 == n { "└─" } else { "├─" };
                        let rpe = ex.target_rpe.map(|r| format!(" @RPE {r}")).unwrap_or_default();
                        let warm = if ex.is_warmup { " warm-up".dimmed().to_string() } else { String::new() };
                        println!(
                            "      {} {} — {} × {}{}{}",
                            connector,
                            ex.name,
                            ex.sets,
                            ex.reps,
                            rpe.dimmed(),
                            warm
                        );
                    }
                }
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPLIT: &str = r#"
        [[days]]
        day = "Monday"
        title = "Push A"

        [[days.exercises]]
        name = "Band Pull-Apart"
        sets = 2
        reps = "15"
        warmup = true

        [[days.exercises]]
        name = "Bench Press (Barbell)"
        sets = 4
        reps = "8-10"
        target_rpe = 8
        lift = "Bench Press"

        [[days]]
        id = "legs"
        day = "Wednesday"
        title = "Legs"

        [[days.exercises]]
        id = "squat"
        name = "Back Squat"
        sets = 5
    "#;

    #[test]
    fn parses_split_with_defaults() {
        let split = parse_plan(SPLIT).unwrap();
        assert_eq!(split.len(), 2);

        let push = &split[0];
        assert_eq!(push.id, "push-a");
        assert_eq!(push.exercises[0].id, "band-pull-apart");
        assert!(push.exercises[0].is_warmup);
        assert_eq!(push.exercises[1].lift.as_deref(), Some("Bench Press"));
        assert_eq!(push.exercises[1].target_rpe, Some(8));

        let legs = &split[1];
        assert_eq!(legs.id, "legs");
        assert_eq!(legs.exercises[0].id, "squat");
        assert_eq!(legs.exercises[0].reps, "10");
        assert_eq!(legs.total_sets(), 5);
    }

    #[test]
    fn rejects_empty_plan() {
        assert!(matches!(parse_plan(""), Err(PlanError::NoDays)));
    }

    #[test]
    fn rejects_day_without_exercises() {
        let raw = r#"
            [[days]]
            day = "Friday"
            title = "Rest?"
        "#;
        assert!(matches!(parse_plan(raw), Err(PlanError::EmptyDay(t)) if t == "Rest?"));
    }

    #[test]
    fn rejects_zero_sets() {
        let raw = r#"
            [[days]]
            day = "Friday"
            title = "Pull"
            [[days.exercises]]
            name = "Row"
            sets = 0
        "#;
        assert!(matches!(parse_plan(raw), Err(PlanError::ZeroSets { .. })));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let raw = r#"
            [[days]]
            day = "Friday"
            title = "Pull"
            [[days.exercises]]
            name = "Row"
            sets = 3
            [[days.exercises]]
            name = "row"
            sets = 3
        "#;
        assert!(matches!(
            parse_plan(raw),
            Err(PlanError::DuplicateExercise { id, .. }) if id == "row"
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(parse_plan("[[days]\n"), Err(PlanError::Parse(_))));
    }
}
