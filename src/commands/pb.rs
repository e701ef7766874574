use anyhow::Result;
use colored::Colorize;
use itertools::Itertools;

use crate::{
    cli::PbCmd,
    commands::Ctx,
    models::ClientRecord,
    records::PersonalBest,
    storage::ClientRepository,
    types::emit,
    utils::{format_weight, plain_len},
};

const HISTORY_SHOWN: usize = 3;

pub async fn handle(cmd: PbCmd, ctx: &Ctx) -> Result<()> {
    match cmd {
        PbCmd::List { client } => {
            let Some(client) = ctx.client(client.as_deref()).await? else {
                return Ok(());
            };
            emit(ctx.fmt, client.personal_bests.entries(), || strength_matrix(&client));
        }

        PbCmd::Track { lift, client } => {
            let Some(mut client) = ctx.client(client.as_deref()).await? else {
                return Ok(());
            };
            let lift = lift.trim();
            if lift.is_empty() {
                println!("{} lift name must not be empty", "error:".red().bold());
                return Ok(());
            }

            if !client.personal_bests.track(lift) {
                println!(
                    "{} `{}` is already tracked for {}",
                    "warning:".yellow().bold(),
                    lift,
                    client.name
                );
                return Ok(());
            }

            ctx.store.save(&client).await?;
            println!(
                "{} now tracking `{}` for {} – tag exercises with `lift = \"{}\"` to match exactly",
                "ok:".green().bold(),
                lift,
                client.name.bold(),
                lift
            );
        }
    }
    Ok(())
}

fn strength_matrix(client: &ClientRecord) {
    let entries = client.personal_bests.entries();
    println!("{} {}", "Strength matrix:".cyan().bold(), client.name.bold());
    if entries.is_empty() {
        println!("{}", "  (no lifts tracked)".dimmed());
        return;
    }

    let left: Vec<String> = entries.iter().map(|pb| format!("  • {}", pb.exercise.bold())).collect();
    let pad_plain = left.iter().map(|s| plain_len(s)).max().unwrap_or(0);

    for (l, pb) in left.iter().zip(entries) {
        let pad = pad_plain + (l.len() - plain_len(l));
        println!("{:<pad$} {} {}", l, "|".blue(), best_cell(pb), pad = pad);
    }
}

fn best_cell(pb: &PersonalBest) -> String {
    if pb.weight <= 0.0 {
        return "–".dimmed().to_string();
    }

    let mut cell = format_weight(pb.weight).green().bold().to_string();
    if let Some(date) = pb.date {
        cell.push_str(&format!(" {}", date.format("%Y-%m-%d").to_string().dimmed()));
    }

    // The newest history entry is the current best itself.
    let earlier = pb
        .recent(HISTORY_SHOWN + 1)
        .skip(1)
        .map(|e| format_weight(e.weight))
        .join(" ← ");
    if !earlier.is_empty() {
        cell.push_str(&format!("  {} {}", "was".dimmed(), earlier.dimmed()));
    }
    cell
}
