//! lingo - GoLingo vendor CLI
//!
//! Signs in to the vendor portal's identity provider and keeps a local
//! session, the same way the portal does in the browser.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("lingo=info".parse()?)
                .add_directive("lingo_core=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = config::Config::load()?;
    if let Some(url) = cli.url {
        config.page.url = url;
    }

    // Execute command
    match cli.command {
        Commands::Auth(cmd) => commands::auth::execute(cmd, &config).await,
        Commands::Srt(cmd) => commands::subtitles::execute(cmd).await,
        Commands::Version => {
            println!("lingo {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
