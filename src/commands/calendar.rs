use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use colored::Colorize;
use itertools::Itertools;
use serde::Serialize;

use crate::{commands::Ctx, models::DailyLog, types::emit};

#[derive(Serialize)]
struct CalendarJson<'a> {
    client: &'a str,
    year: i32,
    month: u32,
    logs: Vec<&'a DailyLog>,
}

/// First and last day of `year`-`month`, or `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

pub async fn handle(ctx: &Ctx, year: Option<i32>, month: Option<u32>, client: Option<&str>) -> Result<()> {
    let now = Local::now();
    let year = year.unwrap_or(now.year());
    let month = month.unwrap_or(now.month());

    let Some((first_day, last_day)) = month_bounds(year, month) else {
        println!("{} month must be between 1 and 12", "error:".red().bold());
        return Ok(());
    };

    let Some(client) = ctx.client(client).await? else {
        return Ok(());
    };

    let logs: Vec<&DailyLog> = client
        .logs
        .iter()
        .filter(|l| l.date >= first_day && l.date <= last_day)
        .sorted_by_key(|l| l.date)
        .collect();

    let json = CalendarJson {
        client: &client.name,
        year,
        month,
        logs: logs.clone(),
    };
    emit(ctx.fmt, &json, || {
        let by_day: BTreeMap<u32, Vec<&DailyLog>> = logs
            .iter()
            .copied()
            .into_group_map_by(|l| l.date.day())
            .into_iter()
            .collect();

        println!("\n{} {}", first_day.format("%B %Y").to_string().bold().cyan(), client.name.dimmed());
        println!("{}", "Su Mo Tu We Th Fr Sa".dimmed());

        let first_weekday = first_day.weekday().num_days_from_sunday() as usize;
        print!("{}", "   ".repeat(first_weekday));

        for day in 1..=last_day.day() {
            if by_day.contains_key(&day) {
                print!("{} ", format!("{day:2}").green().bold());
            } else {
                print!("{day:2} ");
            }
            if (first_weekday + day as usize) % 7 == 0 {
                println!();
            }
        }
        println!("\n");

        if by_day.is_empty() {
            println!("{}", "  (no workouts logged this month)".dimmed());
            return;
        }

        println!("{}", "Workouts:".bold().cyan());
        for log in by_day.values().flatten() {
            let title = log
                .workout_id
                .as_deref()
                .and_then(|id| client.workout_split.iter().find(|d| d.id == id))
                .map(|d| d.title.as_str())
                .or(log.workout_id.as_deref())
                .unwrap_or("-");
            let sets: usize = log.exercise_logs.iter().map(|e| e.completed_sets()).sum();
            println!(
                "  {} {} ({} sets, {:.0}%)",
                log.date.format("%a %b %d").to_string().green(),
                title.bold(),
                sets,
                log.completion
            );
        }
    });

    Ok(())
}
