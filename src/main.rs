mod cli;
mod config;
mod error;
mod export;
mod logo;
mod navigation;
mod offscreen;
mod server;
mod session;
mod slides;
mod templates;

use anyhow::Result;
use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	cli.run().await
}
