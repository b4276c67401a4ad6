use std::path::{Path, PathBuf};

use anyhow::Context;
use banksight_core::Store;
use clap::{self, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use migration::{Migrator, MigratorTrait};

mod command;
mod error;
mod render;

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Data directory path
    #[arg(short, long)]
    data: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: command::Command,
}

fn init_tracing(level: Option<&str>) {
    let filter = level
        .and_then(|l| EnvFilter::try_new(l).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn prepare_db(data: &Path) -> Result<Store, anyhow::Error> {
    std::fs::create_dir_all(data)
        .with_context(|| format!("cannot create data directory {}", data.display()))?;
    let db_path = data.join("banksight.db");
    let store = Store::open_file(&db_path).await?;

    Migrator::up(store.db(), None).await?;
    info!("store ready at {}", db_path.display());
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let store = prepare_db(&args.data).await?;
    let output = render::Output { json: args.json };
    let res = command::run(&store, args.command, &output).await;
    store.close().await?;

    Ok(res?)
}
