use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use crate::{cli::DbCmd, commands::Ctx, models::ClientRecord};

/// Backups are a JSON array of [`ClientRecord`]s, keyed the same way as the
/// documents in the `clients` table.
pub const DEFAULT_EXPORT_FILE: &str = "muskyfit_clients.json";

pub async fn handle(cmd: DbCmd, ctx: &Ctx) -> Result<()> {
    match cmd {
        DbCmd::Export { file } => {
            let path = file.unwrap_or_else(|| DEFAULT_EXPORT_FILE.to_string());
            let clients = ctx.store.list().await?;
            let raw = serde_json::to_string_pretty(&clients).context("Failed to serialize clients")?;
            tokio::fs::write(&path, raw)
                .await
                .with_context(|| format!("Failed to write `{path}`"))?;
            info!(path = %path, count = clients.len(), "exported clients");
            println!(
                "{} exported {} client(s) to {}",
                "ok:".green().bold(),
                clients.len(),
                path.bold()
            );
        }

        DbCmd::Import { file } => {
            let raw = match tokio::fs::read_to_string(&file).await {
                Ok(s) => s,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    println!("{} cannot open file `{}` – file not found", "error:".red().bold(), file);
                    return Ok(());
                }
                Err(e) => return Err(e).with_context(|| format!("reading `{file}`")),
            };

            let records: Vec<ClientRecord> = match serde_json::from_str(&raw) {
                Ok(r) => r,
                Err(e) => {
                    println!("{} `{}` is not a muskyfit export – {}", "error:".red().bold(), file, e);
                    return Ok(());
                }
            };

            let n = ctx.store.import_all(&records).await?;
            println!("{} imported {} client(s) from {}", "ok:".green().bold(), n, file.bold());
        }
    }
    Ok(())
}
