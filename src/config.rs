use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "pitchdeck.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
	pub deck: DeckConfig,
	pub export: ExportConfig,
	pub server: ServerConfig,
	pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
	/// Default logo reference. An empty path starts the deck without a logo.
	pub logo: PathBuf,
}

impl Default for DeckConfig {
	fn default() -> Self {
		Self {
			logo: PathBuf::from("talentlyx-logo.png"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessStrategy {
	/// Wait for the slide document to report that fonts and images are loaded.
	#[default]
	Signal,
	/// Sleep for the fixed settle delay before each capture.
	Settle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
	pub output_dir: PathBuf,
	pub settle_delay_ms: u64,
	pub readiness: ReadinessStrategy,
	pub allow_cross_origin: bool,
	pub capture_logging: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub chrome_path: Option<PathBuf>,
}

impl Default for ExportConfig {
	fn default() -> Self {
		Self {
			output_dir: PathBuf::from("dist"),
			settle_delay_ms: 100,
			readiness: ReadinessStrategy::default(),
			allow_cross_origin: true,
			capture_logging: false,
			chrome_path: None,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 3000,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
	pub filter: String,
}

impl Default for LogConfig {
	fn default() -> Self {
		Self {
			filter: "info".to_string(),
		}
	}
}

impl Config {
	/// Loads the given file, or `pitchdeck.toml` from the working directory
	/// when present, or falls back to defaults.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let path = match path {
			Some(p) => p.to_path_buf(),
			None => {
				let default = PathBuf::from(DEFAULT_CONFIG_FILE);
				if !default.exists() {
					return Ok(Self::default());
				}
				default
			}
		};

		let raw = fs::read_to_string(&path)
			.with_context(|| format!("Failed to read config: {}", path.display()))?;
		toml::from_str(&raw).with_context(|| format!("Invalid config: {}", path.display()))
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		let raw = toml::to_string_pretty(self)?;
		fs::write(path, raw)
			.with_context(|| format!("Failed to write config: {}", path.display()))?;
		Ok(())
	}

	pub fn default_logo(&self) -> Option<&Path> {
		if self.deck.logo.as_os_str().is_empty() {
			None
		} else {
			Some(&self.deck.logo)
		}
	}
}
