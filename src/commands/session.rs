use std::io::Write;

use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    cli::SessionCmd,
    commands::Ctx,
    error::TrackerError,
    models::ClientRecord,
    rest::{RestOutcome, run_countdown},
    storage::ActiveSession,
    tracker::{Rotation, SessionLog, SetUpdate, WorkoutTracker},
    types::{OutputFmt, emit},
    utils::{format_duration, format_weight},
};

#[derive(Serialize)]
struct SessionJson<'a> {
    client: &'a str,
    started_at: String,
    completion: f32,
    session: &'a SessionLog,
}

pub async fn handle(cmd: SessionCmd, ctx: &Ctx) -> Result<()> {
    match cmd {
        SessionCmd::Start { client, day } => start(ctx, client.as_deref(), day).await,
        SessionCmd::Show { client } => {
            let Some((client, active)) = active_session(ctx, client.as_deref()).await? else {
                return Ok(());
            };
            let json = SessionJson {
                client: &client.name,
                started_at: active.started_at.to_rfc3339(),
                completion: active.session.completion_percent(),
                session: &active.session,
            };
            emit(ctx.fmt, &json, || print_session(&client, &active));
            Ok(())
        }
        SessionCmd::Edit {
            exercise,
            set,
            weight,
            reps,
            rpe,
            client,
        } => {
            let Some((_, mut active)) = active_session(ctx, client.as_deref()).await? else {
                return Ok(());
            };
            let Some((ex_idx, set_idx)) = zero_based(exercise, set) else {
                return Ok(());
            };

            let update = SetUpdate { weight, reps, rpe };
            if update == SetUpdate::default() {
                println!(
                    "{} nothing to change – pass --weight, --reps or --rpe",
                    "warning:".yellow().bold()
                );
                return Ok(());
            }

            match active.session.edit_set(ex_idx, set_idx, update) {
                Ok(()) => {
                    ctx.store.save_active(&active).await?;
                    let s = active.session.set(ex_idx, set_idx)?;
                    println!(
                        "{} set {}-{} now {} × {} @RPE {}",
                        "ok:".green().bold(),
                        exercise,
                        set,
                        format_weight(s.weight),
                        s.reps,
                        s.rpe
                    );
                }
                Err(e) => report(e),
            }
            Ok(())
        }
        SessionCmd::Done {
            exercise,
            set,
            no_rest,
            client,
        } => done(ctx, client.as_deref(), exercise, set, no_rest).await,
        SessionCmd::Finish { client } => finish(ctx, client.as_deref()).await,
        SessionCmd::Cancel { client } => {
            let Some(client) = ctx.client(client.as_deref()).await? else {
                return Ok(());
            };
            if ctx.store.clear_active(&client.id).await? {
                println!("{} session cancelled for {}", "ok:".green().bold(), client.name);
            } else {
                println!("{} no active session to cancel", "error:".red().bold());
            }
            Ok(())
        }
    }
}

async fn start(ctx: &Ctx, selector: Option<&str>, day: Option<usize>) -> Result<()> {
    let Some(client) = ctx.client(selector).await? else {
        return Ok(());
    };

    if ctx.store.load_active(&client.id).await?.is_some() {
        println!(
            "{} {} already has an active session – finish or cancel it first",
            "error:".red().bold(),
            client.name
        );
        return Ok(());
    }

    let day_index = match day {
        Some(0) => None,
        Some(n) => Some(n - 1),
        None => Some(client.current_workout_index),
    };
    let Some(workout) = day_index.and_then(|i| client.workout_split.get(i)) else {
        match day {
            Some(n) => println!(
                "{} no day {} in the split (it has {})",
                "error:".red().bold(),
                n,
                client.workout_split.len()
            ),
            None => println!(
                "{} no workout scheduled for {} – import a plan first",
                "error:".red().bold(),
                client.name
            ),
        }
        return Ok(());
    };

    let session = SessionLog::new(workout.clone(), &client.exercise_progress);
    let active = ActiveSession {
        client_id: client.id.clone(),
        started_at: Local::now(),
        day_index,
        session,
    };
    ctx.store.save_active(&active).await?;
    debug!(client = %client.id, workout = %workout.id, "session started");

    println!(
        "{} {} – {} ({})",
        "Session:".cyan().bold(),
        client.name.bold(),
        workout.title.bold(),
        workout.day
    );
    println!("{}", "Exercises:".cyan().bold());
    for (i, ex) in workout.exercises.iter().enumerate() {
        let rpe = ex.target_rpe.map(|r| format!(" @RPE {r}")).unwrap_or_default();
        println!(
            "{} • {} — {} sets of {}{}",
            (i + 1).to_string().yellow(),
            ex.name.bold(),
            ex.sets,
            ex.reps,
            rpe.dimmed()
        );
    }
    println!("\n{} session started", "ok:".green().bold());
    Ok(())
}

async fn done(ctx: &Ctx, selector: Option<&str>, exercise: usize, set: usize, no_rest: bool) -> Result<()> {
    let Some((_, mut active)) = active_session(ctx, selector).await? else {
        return Ok(());
    };
    let Some((ex_idx, set_idx)) = zero_based(exercise, set) else {
        return Ok(());
    };

    let mut tracker = WorkoutTracker::resume(active.session.clone(), ctx.config.rest_policy());

    let toggled = match tracker.toggle_set(ex_idx, set_idx) {
        Ok(t) => t,
        Err(e) => {
            report(e);
            return Ok(());
        }
    };

    active.session = tracker.session().clone();
    ctx.store.save_active(&active).await?;

    let state = if toggled.completed { "completed" } else { "reopened" };
    println!(
        "{} set {}-{} {} ({:.0}% done)",
        "ok:".green().bold(),
        exercise,
        set,
        state,
        tracker.completion_percent()
    );

    if toggled.rest.is_none() || no_rest || ctx.fmt == OutputFmt::Json {
        return Ok(());
    }

    println!("{} resting – Ctrl-C to skip", "info:".blue().bold());
    let cancel = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    let outcome = run_countdown(tracker.rest_mut(), cancel, |left| {
        print!("\r  {:>3}s ", left.to_string().bold());
        let _ = std::io::stdout().flush();
    })
    .await;

    match outcome {
        RestOutcome::Expired => println!("\r{} rest over – next set!", "note:".yellow().bold()),
        RestOutcome::Cancelled { remaining } => {
            println!("\r{} rest skipped with {}s left", "note:".yellow().bold(), remaining)
        }
        RestOutcome::Idle => {}
    }
    Ok(())
}

async fn finish(ctx: &Ctx, selector: Option<&str>) -> Result<()> {
    let Some((mut client, active)) = active_session(ctx, selector).await? else {
        return Ok(());
    };

    // The rotation continues from the day actually trained, which differs
    // from the stored index after `session start --day`.
    let rotation = Rotation {
        current: active.day_index.unwrap_or(client.current_workout_index),
        split_len: client.workout_split.len(),
    };
    let elapsed = Local::now() - active.started_at;
    let today = Local::now().date_naive();

    let tracker = WorkoutTracker::resume(active.session, ctx.config.rest_policy());
    let finished = tracker.finish(
        rotation,
        &mut client.personal_bests,
        ctx.config.lift_matching(),
        today,
    );
    client.record_workout(&finished, today);
    ctx.store.complete_session(&client).await?;

    emit(ctx.fmt, &finished, || {
        println!(
            "{} session finished for {} ({:.0}% of sets, {})",
            "ok:".green().bold(),
            client.name.bold(),
            finished.completion,
            format_duration(elapsed)
        );
        for pb in &finished.pb_updates {
            println!(
                "{} new {} best: {} (was {})",
                "note:".yellow().bold(),
                pb.lift.bold(),
                format_weight(pb.weight).green().bold(),
                format_weight(pb.previous)
            );
        }
        if let Some(next) = client.next_workout() {
            println!("{} {} ({})", "Next:".cyan().bold(), next.title.bold(), next.day);
        }
    });
    Ok(())
}

/// Resolve the client and their active session, reporting when there is none.
async fn active_session(ctx: &Ctx, selector: Option<&str>) -> Result<Option<(ClientRecord, ActiveSession)>> {
    let Some(client) = ctx.client(selector).await? else {
        return Ok(None);
    };
    match ctx.store.load_active(&client.id).await? {
        Some(active) => Ok(Some((client, active))),
        None => {
            println!("{} no active session for {}", "error:".red().bold(), client.name);
            Ok(None)
        }
    }
}

/// Convert the 1-based indices users type into 0-based ones.
fn zero_based(exercise: usize, set: usize) -> Option<(usize, usize)> {
    match (exercise.checked_sub(1), set.checked_sub(1)) {
        (Some(e), Some(s)) => Some((e, s)),
        _ => {
            println!("{} exercise and set indices start at 1", "error:".red().bold());
            None
        }
    }
}

fn report(err: TrackerError) {
    // Indices in messages are 1-based like the CLI arguments.
    let msg = match err {
        TrackerError::NoSuchExercise { index, len } => {
            format!("no exercise at index {} (session has {})", index + 1, len)
        }
        TrackerError::NoSuchSet { exercise, set, len } => {
            format!("no set {} for exercise {} (it has {})", set + 1, exercise + 1, len)
        }
        TrackerError::SetLocked { exercise, set } => format!(
            "set {}-{} is completed and locked – run `session done {} {}` to reopen it",
            exercise + 1,
            set + 1,
            exercise + 1,
            set + 1
        ),
        other => other.to_string(),
    };
    println!("{} {}", "error:".red().bold(), msg);
}

fn print_session(client: &ClientRecord, active: &ActiveSession) {
    let session = &active.session;
    let day = session.day();
    let elapsed = Local::now() - active.started_at;

    println!(
        "{} {} – {} (started {}, duration: {})",
        "Session:".cyan().bold(),
        client.name.bold(),
        day.title.bold(),
        active.started_at.format("%Y-%m-%d %H:%M"),
        format_duration(elapsed)
    );
    println!(
        "{} {:.0}% ({}/{} sets)",
        "Completion:".cyan().bold(),
        session.completion_percent(),
        session.completed_sets(),
        session.total_sets()
    );

    println!("\n{}", "Exercises:".cyan().bold());
    for (i, (ex, log)) in day.exercises.iter().zip(session.logs()).enumerate() {
        let warm = if ex.is_warmup { " (warm-up)".dimmed().to_string() } else { String::new() };
        let target = format!(" – {} × {}", ex.sets, ex.reps).dimmed();
        println!("{} • {}{}{}", (i + 1).to_string().yellow(), ex.name.bold(), target, warm);

        for (j, s) in log.sets.iter().enumerate() {
            let line = format!("{:>8} × {:<3} @RPE {}", format_weight(s.weight), s.reps, s.rpe);
            let (mark, line) = if s.completed {
                ("✓".green().bold().to_string(), line.green().to_string())
            } else {
                ("·".dimmed().to_string(), line)
            };
            println!("   {} {} {}", (j + 1).to_string().yellow(), mark, line);
        }
        println!();
    }
}
