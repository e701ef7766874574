pub mod calendar;
pub mod client;
pub mod config;
pub mod db;
pub mod pb;
pub mod plan;
pub mod session;

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use crate::error::StoreError;
use crate::models::ClientRecord;
use crate::records::best_suggestion;
use crate::storage::{ClientRepository, SqliteStore};
use crate::types::{Config, OutputFmt};

/// Everything a command handler needs.
pub struct Ctx {
    pub store: SqliteStore,
    pub config: Config,
    pub config_path: PathBuf,
    pub fmt: OutputFmt,
}

impl Ctx {
    /// Resolve a client from a 1-based index, a name, or the configured
    /// default. Problems are reported to the user and yield `None`.
    pub async fn client(&self, selector: Option<&str>) -> Result<Option<ClientRecord>> {
        match selector {
            Some(sel) => self.client_by_selector(sel).await,
            None => self.default_client().await,
        }
    }

    async fn client_by_selector(&self, sel: &str) -> Result<Option<ClientRecord>> {
        if let Ok(idx) = sel.parse::<usize>() {
            let mut clients = self.store.list().await?;
            if idx == 0 || idx > clients.len() {
                println!("{} no client at index {}", "error:".red().bold(), idx);
                return Ok(None);
            }
            return Ok(Some(clients.swap_remove(idx - 1)));
        }

        if let Some(client) = self.store.find_by_name(sel).await? {
            return Ok(Some(client));
        }

        let clients = self.store.list().await?;
        print!("{} no client named `{}`", "error:".red().bold(), sel);
        match best_suggestion(sel, clients.iter().map(|c| c.name.as_str())) {
            Some(s) => println!(" – did you mean `{}`?", s.green()),
            None => println!(),
        }
        Ok(None)
    }

    async fn default_client(&self) -> Result<Option<ClientRecord>> {
        if let Some(id) = self.config.active_client() {
            return match self.store.load(id).await {
                Ok(c) => Ok(Some(c)),
                Err(StoreError::ClientNotFound(_)) => {
                    println!(
                        "{} active client `{}` no longer exists – pick one with `client use`",
                        "error:".red().bold(),
                        id
                    );
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            };
        }

        let mut clients = self.store.list().await?;
        match clients.len() {
            0 => {
                println!("{} no clients yet – add one with `client add`", "error:".red().bold());
                Ok(None)
            }
            1 => Ok(clients.pop()),
            _ => {
                println!(
                    "{} several clients exist – pass --client or run `client use`",
                    "error:".red().bold()
                );
                Ok(None)
            }
        }
    }
}
