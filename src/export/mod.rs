//! Deck export: every slide rasterized in order into one PDF.

pub mod capture;
pub mod output;
pub mod pdf;
pub mod raster;

use image::Rgb;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::{ExportConfig, ReadinessStrategy};
use crate::error::{ExportError, Result};
use crate::offscreen::OffscreenSlideSet;
use crate::slides::TOTAL_SLIDES;

use self::capture::{CaptureOptions, CaptureSurface, Readiness};
use self::output::{DocumentSink, Notifier};
use self::pdf::{PageAssembler, SLIDE_PAGE};

pub const EXPORT_FILE_NAME: &str = "Nabrah-Proposal-TalentlyX.pdf";
pub const FAILURE_MESSAGE: &str = "Export failed. Please try again.";
pub const CAPTURE_SCALE: f64 = 2.0;
pub const JPEG_QUALITY: f32 = 0.9;
pub const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ExportState {
	Idle,
	Running { progress: u8 },
}

impl ExportState {
	pub fn is_running(&self) -> bool {
		matches!(self, ExportState::Running { .. })
	}

	pub fn progress(&self) -> u8 {
		match self {
			ExportState::Idle => 0,
			ExportState::Running { progress } => *progress,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpisodeOutcome {
	Saved(PathBuf),
	Failed,
	/// Another export was already running.
	Ignored,
}

/// Percentage of the deck completed after `done` slides, rounded half up.
pub fn progress_for(done: usize, total: usize) -> u8 {
	if total == 0 {
		return 100;
	}
	((200 * done + total) / (2 * total)).min(100) as u8
}

#[derive(Debug, Clone)]
pub struct ExportSettings {
	pub readiness: ReadinessStrategy,
	pub settle_delay: Duration,
	pub allow_cross_origin: bool,
	pub capture_logging: bool,
}

impl From<&ExportConfig> for ExportSettings {
	fn from(config: &ExportConfig) -> Self {
		Self {
			readiness: config.readiness,
			settle_delay: Duration::from_millis(config.settle_delay_ms),
			allow_cross_origin: config.allow_cross_origin,
			capture_logging: config.capture_logging,
		}
	}
}

/// Proof that the pipeline is `Running`. Dropping it returns the pipeline to
/// `Idle` with zero progress, whatever happened in between.
pub struct Episode {
	state: Arc<watch::Sender<ExportState>>,
}

impl Drop for Episode {
	fn drop(&mut self) {
		self.state.send_replace(ExportState::Idle);
	}
}

pub struct ExportPipeline {
	state: Arc<watch::Sender<ExportState>>,
	settings: ExportSettings,
	sink: Arc<dyn DocumentSink>,
	notifier: Arc<dyn Notifier>,
}

impl ExportPipeline {
	pub fn new(settings: ExportSettings, sink: Arc<dyn DocumentSink>, notifier: Arc<dyn Notifier>) -> Self {
		let (state, _) = watch::channel(ExportState::Idle);
		Self {
			state: Arc::new(state),
			settings,
			sink,
			notifier,
		}
	}

	pub fn state(&self) -> ExportState {
		*self.state.borrow()
	}

	pub fn subscribe(&self) -> watch::Receiver<ExportState> {
		self.state.subscribe()
	}

	/// Moves `Idle` to `Running(0)`. Returns `None` while an episode is
	/// already running.
	pub fn begin(&self) -> Option<Episode> {
		let started = self.state.send_if_modified(|state| {
			if state.is_running() {
				false
			} else {
				*state = ExportState::Running { progress: 0 };
				true
			}
		});

		started.then(|| Episode {
			state: Arc::clone(&self.state),
		})
	}

	/// Starts and runs an episode, or does nothing if one is in progress.
	pub async fn run<S, A>(&self, slides: Arc<OffscreenSlideSet>, surface: S, assembler: A) -> EpisodeOutcome
	where
		S: CaptureSurface + 'static,
		A: PageAssembler,
	{
		match self.begin() {
			Some(episode) => self.run_episode(episode, slides, surface, assembler).await,
			None => {
				debug!("Export already running; request ignored");
				EpisodeOutcome::Ignored
			}
		}
	}

	pub async fn run_episode<S, A>(
		&self,
		episode: Episode,
		slides: Arc<OffscreenSlideSet>,
		surface: S,
		assembler: A,
	) -> EpisodeOutcome
	where
		S: CaptureSurface + 'static,
		A: PageAssembler,
	{
		info!("Exporting {} slides", TOTAL_SLIDES);

		let outcome = match self.drive(slides, surface, assembler).await {
			Ok(path) => {
				info!("Export saved to {}", path.display());
				EpisodeOutcome::Saved(path)
			}
			Err(e) => {
				error!("PDF export failed: {}", e);
				self.notifier.notify_failure(FAILURE_MESSAGE);
				EpisodeOutcome::Failed
			}
		};

		drop(episode);
		outcome
	}

	fn capture_options(&self) -> CaptureOptions {
		CaptureOptions {
			scale: CAPTURE_SCALE,
			allow_cross_origin: self.settings.allow_cross_origin,
			background: BACKGROUND,
			logging: self.settings.capture_logging,
		}
	}

	async fn drive<S, A>(&self, slides: Arc<OffscreenSlideSet>, surface: S, mut assembler: A) -> Result<PathBuf>
	where
		S: CaptureSurface + 'static,
		A: PageAssembler,
	{
		if !slides.is_complete() {
			return Err(ExportError::MissingCaptureTarget(format!(
				"expected {} slide documents, found {}",
				TOTAL_SLIDES,
				slides.len()
			)));
		}

		let surface = Arc::new(Mutex::new(surface));
		let options = self.capture_options();

		let mounted = {
			let slides = Arc::clone(&slides);
			let options = options.clone();
			on_surface(&surface, move |s| s.mount(&slides, &options)).await
		};

		let captured = match mounted {
			Ok(()) => self.capture_all(&surface, &mut assembler, &options).await,
			Err(e) => Err(e),
		};

		// Hidden again whether or not the capture succeeded.
		if let Err(e) = on_surface(&surface, |s| {
			s.unmount();
			Ok(())
		})
		.await
		{
			error!("Failed to unmount capture surface: {}", e);
		}

		captured?;
		debug!("Assembling {} pages", assembler.page_count());
		let bytes = assembler.finish()?;
		self.sink.save(EXPORT_FILE_NAME, &bytes)
	}

	async fn capture_all<S, A>(&self, surface: &Arc<Mutex<S>>, assembler: &mut A, options: &CaptureOptions) -> Result<()>
	where
		S: CaptureSurface + 'static,
		A: PageAssembler,
	{
		let await_signal = self.settings.readiness == ReadinessStrategy::Signal;
		let quality = raster::jpeg_quality(JPEG_QUALITY);

		for index in 0..TOTAL_SLIDES {
			let readiness = on_surface(surface, move |s| s.present(index, await_signal)).await?;
			if readiness == Readiness::Unknown {
				tokio::time::sleep(self.settings.settle_delay).await;
			}

			let opts = options.clone();
			let image = on_surface(surface, move |s| {
				let raster = s.capture(index, &opts)?;
				raster::encode_jpeg(&raster, opts.background, quality)
			})
			.await?;

			if index > 0 {
				assembler.add_page(SLIDE_PAGE)?;
			}
			assembler.add_image(&image, 0.0, 0.0, SLIDE_PAGE.width, SLIDE_PAGE.height)?;

			let progress = progress_for(index + 1, TOTAL_SLIDES);
			self.state.send_replace(ExportState::Running { progress });

			if options.logging {
				debug!("Slide {} exported ({}%)", index, progress);
			}
		}

		Ok(())
	}
}

/// Runs a blocking surface call off the async runtime.
async fn on_surface<S, T, F>(surface: &Arc<Mutex<S>>, f: F) -> Result<T>
where
	S: CaptureSurface + 'static,
	T: Send + 'static,
	F: FnOnce(&mut S) -> Result<T> + Send + 'static,
{
	let surface = Arc::clone(surface);
	tokio::task::spawn_blocking(move || {
		let mut guard = surface.lock().unwrap_or_else(PoisonError::into_inner);
		f(&mut guard)
	})
	.await?
}
