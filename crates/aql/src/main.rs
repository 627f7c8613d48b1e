use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{App, Commands};
use crate::config::Config;
use crate::store::AnyStore;

mod cli;
mod config;
mod pipeline;
mod progress;
mod store;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let app = App::parse();
    let config = Config::load(&app.config)?;

    match app.cmd {
        Commands::Captures(arg) => pipeline::captures(&config, arg).await,
        Commands::Archive => match AnyStore::open(&config).await? {
            AnyStore::Local(store) => pipeline::archive(&config, store).await,
            AnyStore::Remote(store) => pipeline::archive(&config, store).await,
        },
        Commands::Read(arg) => pipeline::read(&config, arg).await,
    }
}
