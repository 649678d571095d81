use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, ReadinessStrategy, DEFAULT_CONFIG_FILE};
use crate::export::capture::ChromeSurface;
use crate::export::output::{ConsoleNotifier, DirectorySink};
use crate::export::pdf::{LopdfAssembler, Orientation, SLIDE_PAGE};
use crate::export::{EpisodeOutcome, ExportPipeline, ExportSettings, ExportState};
use crate::logo::LogoAssetManager;
use crate::offscreen::OffscreenSlideSet;
use crate::server::DeckServer;
use crate::templates::TemplateEngine;

#[derive(Parser)]
#[command(name = "pitchdeck")]
#[command(about = "Present the TalentlyX proposal deck and export it to PDF")]
#[command(version)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Present the deck in the browser
	Serve {
		/// Configuration file (default: pitchdeck.toml if present)
		#[arg(short, long)]
		config: Option<PathBuf>,

		/// Port to serve on
		#[arg(short, long)]
		port: Option<u16>,

		/// Address to bind
		#[arg(long)]
		host: Option<String>,

		/// Default logo file
		#[arg(short, long)]
		logo: Option<PathBuf>,
	},

	/// Export every slide to a PDF without a browser window
	Export {
		/// Output directory (default: dist/)
		#[arg(short, long)]
		output: Option<PathBuf>,

		/// Logo file placed on every page
		#[arg(short, long)]
		logo: Option<PathBuf>,

		/// Configuration file (default: pitchdeck.toml if present)
		#[arg(short, long)]
		config: Option<PathBuf>,

		/// Sleep this long before each capture instead of waiting for the
		/// slide to report its images loaded
		#[arg(long)]
		settle_delay: Option<u64>,

		/// Chrome or Chromium executable
		#[arg(long)]
		chrome: Option<PathBuf>,
	},

	/// Write a default configuration file
	Init {
		/// Directory to initialize
		#[arg(default_value = ".")]
		dir: PathBuf,
	},
}

impl Cli {
	pub async fn run(self) -> Result<()> {
		match self.command {
			Commands::Serve {
				config,
				port,
				host,
				logo,
			} => {
				let mut config = Config::load(config.as_deref())?;
				if let Some(port) = port {
					config.server.port = port;
				}
				if let Some(host) = host {
					config.server.host = host;
				}
				if let Some(logo) = logo {
					config.deck.logo = logo;
				}
				init_tracing(&config.log.filter);

				let server = DeckServer::new(&config)?;
				server.serve().await?;
			}
			Commands::Export {
				output,
				logo,
				config,
				settle_delay,
				chrome,
			} => {
				let mut config = Config::load(config.as_deref())?;
				if let Some(output) = output {
					config.export.output_dir = output;
				}
				if let Some(logo) = logo {
					config.deck.logo = logo;
				}
				if let Some(ms) = settle_delay {
					config.export.settle_delay_ms = ms;
					config.export.readiness = ReadinessStrategy::Settle;
				}
				if chrome.is_some() {
					config.export.chrome_path = chrome;
				}
				init_tracing(&config.log.filter);

				let path = export(&config).await?;
				println!("Export complete. Output: {}", path.display());
			}
			Commands::Init { dir } => {
				init_tracing("info");
				let path = dir.join(DEFAULT_CONFIG_FILE);
				if path.exists() {
					bail!("{} already exists", path.display());
				}
				std::fs::create_dir_all(&dir)
					.with_context(|| format!("Failed to create {}", dir.display()))?;
				Config::default().save(&path)?;

				println!("Initialized deck configuration in {}", path.display());
			}
		}
		Ok(())
	}
}

async fn export(config: &Config) -> Result<PathBuf> {
	let logo = LogoAssetManager::new(config.default_logo());
	let slides = OffscreenSlideSet::build(&TemplateEngine::new(), logo.current(), logo.generation())
		.context("Failed to prepare slide documents")?;

	let pipeline = ExportPipeline::new(
		ExportSettings::from(&config.export),
		Arc::new(DirectorySink::new(&config.export.output_dir)),
		Arc::new(ConsoleNotifier),
	);

	let mut progress = pipeline.subscribe();
	let reporter = tokio::spawn(async move {
		while progress.changed().await.is_ok() {
			if let ExportState::Running { progress: percent } = *progress.borrow_and_update() {
				println!("Exporting... {}%", percent);
			}
		}
	});

	let outcome = pipeline
		.run(
			Arc::new(slides),
			ChromeSurface::new(config.export.chrome_path.clone()),
			LopdfAssembler::new(SLIDE_PAGE, Orientation::Landscape),
		)
		.await;

	drop(pipeline);
	// Ends once the pipeline and its state channel are gone.
	let _ = reporter.await;

	match outcome {
		EpisodeOutcome::Saved(path) => Ok(path),
		EpisodeOutcome::Failed => bail!("Export to {} failed", config.export.output_dir.display()),
		EpisodeOutcome::Ignored => bail!("An export is already running"),
	}
}

fn init_tracing(default_filter: &str) {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
		.init();
}
