use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::{
    cli::ClientCmd,
    commands::Ctx,
    models::ClientRecord,
    storage::ClientRepository,
    types::{KEY_ACTIVE_CLIENT, emit},
    utils::{format_weight, plain_len},
};

#[derive(Serialize)]
struct ClientJson<'a> {
    idx: usize,
    id: &'a str,
    name: &'a str,
    active: bool,
    next_workout: Option<&'a str>,
    sessions: usize,
}

pub async fn handle(cmd: ClientCmd, ctx: &mut Ctx) -> Result<()> {
    match cmd {
        ClientCmd::Add { name, email } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                println!("{} client name must not be empty", "error:".red().bold());
                return Ok(());
            }
            if ctx.store.find_by_name(&name).await?.is_some() {
                println!(
                    "{} client \"{}\" already exists – use `client list` to view all clients",
                    "warning:".yellow().bold(),
                    name
                );
                return Ok(());
            }

            let client = ClientRecord::new(&name, email);
            ctx.store.save(&client).await?;
            println!("{} client \"{}\" added (id: {})", "ok:".green().bold(), name, client.id);

            if ctx.config.active_client().is_none() {
                ctx.config.map.insert(KEY_ACTIVE_CLIENT.to_string(), client.id.clone());
                ctx.config.save(&ctx.config_path)?;
                println!("{} \"{}\" is now the active client", "info:".blue().bold(), name);
            }
        }

        ClientCmd::List => {
            let clients = ctx.store.list().await?;
            let active = ctx.config.active_client();
            let rows: Vec<ClientJson> = clients
                .iter()
                .enumerate()
                .map(|(i, c)| ClientJson {
                    idx: i + 1,
                    id: &c.id,
                    name: &c.name,
                    active: active == Some(c.id.as_str()),
                    next_workout: c.next_workout().map(|d| d.title.as_str()),
                    sessions: c.sessions_completed(),
                })
                .collect();

            emit(ctx.fmt, &rows, || pretty_list(&rows));
        }

        ClientCmd::Show { client } => {
            let Some(client) = ctx.client(client.as_deref()).await? else {
                return Ok(());
            };
            emit(ctx.fmt, &client, || pretty_show(&client));
        }

        ClientCmd::Use { client } => {
            let Some(client) = ctx.client(Some(client.as_str())).await? else {
                return Ok(());
            };
            ctx.config.map.insert(KEY_ACTIVE_CLIENT.to_string(), client.id.clone());
            ctx.config.save(&ctx.config_path)?;
            println!("{} \"{}\" is now the active client", "ok:".green().bold(), client.name);
        }
    }

    Ok(())
}

fn pretty_list(rows: &[ClientJson]) {
    if rows.is_empty() {
        println!("{}", "  (no clients found)".dimmed());
        return;
    }

    println!("{}", "Clients:".cyan().bold());
    let left: Vec<String> = rows
        .iter()
        .map(|r| {
            let marker = if r.active { "*".green().bold().to_string() } else { " ".to_string() };
            format!("{} {} • {}", marker, r.idx.to_string().yellow(), r.name.bold())
        })
        .collect();
    let pad_plain = left.iter().map(|s| plain_len(s)).max().unwrap_or(0);

    for (l, r) in left.iter().zip(rows) {
        let pad = pad_plain + (l.len() - plain_len(l));
        let next = r.next_workout.unwrap_or("no plan");
        println!(
            "{:<pad$} {} next: {} – {} sessions",
            l,
            "|".blue(),
            next,
            r.sessions,
            pad = pad
        );
    }
}

fn pretty_show(client: &ClientRecord) {
    println!("{} {}", "Client:".cyan().bold(), client.name.bold());
    if let Some(email) = &client.email {
        println!("  {}", email.dimmed());
    }
    println!(
        "  {} {}",
        "since".dimmed(),
        client.created_at.format("%Y-%m-%d")
    );

    match client.next_workout() {
        Some(day) => println!(
            "\n{} session {} of {} – {} ({})",
            "Next:".cyan().bold(),
            client.current_workout_index + 1,
            client.workout_split.len(),
            day.title.bold(),
            day.day
        ),
        None => println!("\n{} no plan assigned – import one with `plan import`", "Next:".cyan().bold()),
    }

    if !client.exercise_progress.is_empty() {
        println!("\n{}", "Working weights:".cyan().bold());
        for (id, w) in &client.exercise_progress {
            println!("  • {} {}", id, format_weight(*w).green());
        }
    }

    println!("\n{} {} completed", "Sessions:".cyan().bold(), client.sessions_completed());
    for log in client.logs.iter().rev().take(5) {
        println!(
            "  • {} {} ({:.0}% of sets)",
            log.date.format("%a %d %b %Y").to_string().yellow(),
            log.workout_id.as_deref().unwrap_or("-"),
            log.completion
        );
    }
}
