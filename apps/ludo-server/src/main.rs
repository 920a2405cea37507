//! Ludo server binary.

mod cli;

use clap::Parser;
use cli::Cli;
use ludo::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log)),
        )
        .init();

    let server = LudoServer::builder()
        .bind(&cli.bind)
        .session_config(cli.session_config())
        .queue_config(cli.queue_config())
        .build()
        .await?;
    tracing::info!(addr = %server.local_addr()?, forced_dice = cli.allow_forced_dice, "starting Ludo server");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }
    Ok(())
}
