use anyhow::Result;
use clap::Parser;
use tracing::debug;

use muskyfit::{
    cli::{Cli, Commands},
    commands::{self, Ctx},
    db, logging,
    storage::SqliteStore,
    types::{Config, OutputFmt},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config_path = Config::default_path()?;
    let config = Config::load(&config_path)?;
    let db_path = config.db_path();
    debug!(config = %config_path.display(), db = %db_path, "starting");

    let pool = db::open(&db_path).await?;
    let mut ctx = Ctx {
        store: SqliteStore::new(pool),
        config,
        config_path,
        fmt: OutputFmt::from_flag(cli.json),
    };

    match cli.cmd {
        Commands::Client(cmd) => commands::client::handle(cmd, &mut ctx).await?,
        Commands::Plan(cmd) => commands::plan::handle(cmd, &ctx).await?,
        Commands::Session(cmd) => commands::session::handle(cmd, &ctx).await?,
        Commands::Pb(cmd) => commands::pb::handle(cmd, &ctx).await?,
        Commands::Calendar { year, month, client } => {
            commands::calendar::handle(&ctx, year, month, client.as_deref()).await?
        }
        Commands::Config(cmd) => commands::config::handle(cmd, &mut ctx).await?,
        Commands::Db(cmd) => commands::db::handle(cmd, &ctx).await?,
    }

    ctx.store.pool().close().await;
    Ok(())
}
