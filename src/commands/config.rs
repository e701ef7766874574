use anyhow::Result;
use colored::Colorize;

use crate::{
    cli::ConfigCmd,
    commands::Ctx,
    records::best_suggestion,
    types::{KNOWN_KEYS, emit},
};

pub async fn handle(cmd: ConfigCmd, ctx: &mut Ctx) -> Result<()> {
    let cfg = &mut ctx.config;

    match cmd {
        ConfigCmd::List => {
            emit(ctx.fmt, &cfg.map, || {
                println!("{} {}", "Config:".cyan().bold(), ctx.config_path.display().to_string().dimmed());
                for (key, about) in KNOWN_KEYS.iter() {
                    let val = cfg.get(key).map(|v| v.to_string()).unwrap_or_else(|| "(unset)".dimmed().to_string());
                    println!("  {} = {}  {}", key.green(), val, format!("# {about}").dimmed());
                }
                for (k, v) in cfg.map.iter().filter(|(k, _)| !KNOWN_KEYS.contains_key(k.as_str())) {
                    println!("  {} = {}  {}", k.yellow(), v, "# unknown key".dimmed());
                }
            });
        }

        ConfigCmd::Get { key } => match cfg.get(&key) {
            Some(val) => println!("{}", val),
            None => println!("{} key `{}` not found", "warning:".yellow().bold(), key),
        },

        ConfigCmd::Set { key, val } => {
            if !KNOWN_KEYS.contains_key(key.as_str()) {
                print!("{} `{}` is not a key muskyfit reads", "warning:".yellow().bold(), key);
                match best_suggestion(&key, KNOWN_KEYS.keys().copied()) {
                    Some(s) => println!(" – did you mean `{}`?", s.green()),
                    None => println!(),
                }
            }
            cfg.map.insert(key.clone(), val.clone());
            cfg.save(&ctx.config_path)?;
            println!("{} set `{}` = `{}`", "info:".blue().bold(), key.green(), val);
        }

        ConfigCmd::Unset { key } => {
            if cfg.map.remove(&key).is_some() {
                cfg.save(&ctx.config_path)?;
                println!("{} removed `{}`", "info:".blue().bold(), key.green());
            } else {
                println!("{} key `{}` not found", "warning:".yellow().bold(), key);
            }
        }
    }

    Ok(())
}
