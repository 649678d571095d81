//! State behind the live deck: current slide, logo, pre-rendered slide set
//! and the export pipeline. Each piece has a single writer.

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{info, warn};

use crate::config::Config;
use crate::export::capture::{CaptureSurface, ChromeSurface};
use crate::error::Result as ExportResult;
use crate::export::output::{DirectorySink, DocumentSink, Notifier};
use crate::export::pdf::{LopdfAssembler, Orientation, SLIDE_PAGE};
use crate::export::{ExportPipeline, ExportSettings, ExportState, EXPORT_FILE_NAME};
use crate::logo::{LogoAssetManager, LogoFile, LogoReference};
use crate::navigation::{InputEvent, NavigationController};
use crate::offscreen::OffscreenSlideSet;
use crate::slides::TOTAL_SLIDES;
use crate::templates::{TemplateEngine, ViewerContext};

pub type SurfaceFactory = Arc<dyn Fn() -> Box<dyn CaptureSurface> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
	pub id: u64,
	pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
	pub id: u64,
	pub url: String,
}

/// Keeps the latest failure notice for the browser to pick up.
#[derive(Default)]
pub struct SessionNotifier {
	next_id: AtomicU64,
	latest: Mutex<Option<Notice>>,
}

impl SessionNotifier {
	pub fn latest(&self) -> Option<Notice> {
		lock(&self.latest).clone()
	}
}

impl Notifier for SessionNotifier {
	fn notify_failure(&self, message: &str) {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
		*lock(&self.latest) = Some(Notice {
			id,
			message: message.to_string(),
		});
	}
}

/// Saves into the output directory and publishes a download link for the
/// browser before the episode returns to idle.
pub struct SessionSink {
	inner: DirectorySink,
	next_id: AtomicU64,
	latest: Mutex<Option<Download>>,
}

impl SessionSink {
	pub fn new(dir: &Path) -> Self {
		Self {
			inner: DirectorySink::new(dir),
			next_id: AtomicU64::new(0),
			latest: Mutex::new(None),
		}
	}

	pub fn latest(&self) -> Option<Download> {
		lock(&self.latest).clone()
	}

	/// Path of a finished export, if `file` names one.
	pub fn path_for(&self, file: &str) -> Option<PathBuf> {
		if file != EXPORT_FILE_NAME {
			warn!("Rejected download request for {}", file);
			return None;
		}
		let path = self.inner.dir().join(file);
		path.is_file().then_some(path)
	}
}

impl DocumentSink for SessionSink {
	fn save(&self, file_name: &str, bytes: &[u8]) -> ExportResult<PathBuf> {
		let path = self.inner.save(file_name, bytes)?;
		let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
		*lock(&self.latest) = Some(Download {
			id,
			url: format!("/download/{}", file_name),
		});
		Ok(path)
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoStatus {
	pub kind: &'static str,
	pub name: Option<String>,
	pub src: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
	pub index: usize,
	pub total: usize,
	pub label: String,
	pub first: bool,
	pub last: bool,
	pub logo: LogoStatus,
	pub export: ExportState,
	pub notice: Option<Notice>,
	pub download: Option<Download>,
}

pub struct DeckSession {
	engine: Arc<TemplateEngine>,
	navigation: Mutex<NavigationController>,
	logo: RwLock<LogoAssetManager>,
	slides: RwLock<Arc<OffscreenSlideSet>>,
	pipeline: Arc<ExportPipeline>,
	notices: Arc<SessionNotifier>,
	downloads: Arc<SessionSink>,
	surfaces: SurfaceFactory,
}

impl DeckSession {
	pub fn new(config: &Config) -> Result<Arc<Self>> {
		let chrome_path = config.export.chrome_path.clone();
		let surfaces: SurfaceFactory =
			Arc::new(move || Box::new(ChromeSurface::new(chrome_path.clone())) as Box<dyn CaptureSurface>);
		Self::with_surfaces(config, surfaces)
	}

	pub fn with_surfaces(config: &Config, surfaces: SurfaceFactory) -> Result<Arc<Self>> {
		let engine = Arc::new(TemplateEngine::new());
		let logo = LogoAssetManager::new(config.default_logo());
		let slides = OffscreenSlideSet::build(&engine, logo.current(), logo.generation())?;

		let notices = Arc::new(SessionNotifier::default());
		let downloads = Arc::new(SessionSink::new(&config.export.output_dir));
		let pipeline = ExportPipeline::new(
			ExportSettings::from(&config.export),
			downloads.clone(),
			notices.clone(),
		);

		Ok(Arc::new(Self {
			engine,
			navigation: Mutex::new(NavigationController::new()),
			logo: RwLock::new(logo),
			slides: RwLock::new(Arc::new(slides)),
			pipeline: Arc::new(pipeline),
			notices,
			downloads,
			surfaces,
		}))
	}

	pub fn engine(&self) -> &TemplateEngine {
		&self.engine
	}

	pub fn index(&self) -> usize {
		lock(&self.navigation).index()
	}

	pub fn handle_input(&self, event: &InputEvent) -> SessionSnapshot {
		lock(&self.navigation).handle(event);
		self.snapshot()
	}

	pub fn export_state(&self) -> ExportState {
		self.pipeline.state()
	}

	pub fn slides(&self) -> Arc<OffscreenSlideSet> {
		Arc::clone(&self.slides.read().unwrap_or_else(PoisonError::into_inner))
	}

	pub fn logo(&self) -> LogoReference {
		self.logo
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.current()
			.clone()
	}

	/// URL the live view uses for the logo, versioned so browsers refetch
	/// after a replacement.
	pub fn logo_src(&self) -> Option<String> {
		let logo = self.logo.read().unwrap_or_else(PoisonError::into_inner);
		if logo.current().is_none() {
			None
		} else {
			Some(format!("/logo?v={}", logo.generation()))
		}
	}

	pub fn set_logo(&self, file: LogoFile) -> Result<()> {
		info!(
			"Logo replaced by {} ({}, {} bytes)",
			file.file_name.as_deref().unwrap_or("upload"),
			file.content_type,
			file.bytes.len()
		);
		self.update_logo(|logo| {
			logo.set_logo(file);
			true
		})
	}

	pub fn clear_logo(&self) -> Result<()> {
		self.update_logo(|logo| {
			logo.clear();
			true
		})
	}

	/// Re-renders the slide set after the default logo file changed on disk.
	pub fn reload_default_logo(&self, path: &Path) -> Result<bool> {
		let mut touched = false;
		self.update_logo(|logo| {
			touched = logo.touch_default(path);
			touched
		})?;
		Ok(touched)
	}

	fn update_logo(&self, change: impl FnOnce(&mut LogoAssetManager) -> bool) -> Result<()> {
		let (reference, generation) = {
			let mut logo = self.logo.write().unwrap_or_else(PoisonError::into_inner);
			if !change(&mut logo) {
				return Ok(());
			}
			(logo.current().clone(), logo.generation())
		};

		let rebuilt = OffscreenSlideSet::build(&self.engine, &reference, generation)?;

		let mut slides = self.slides.write().unwrap_or_else(PoisonError::into_inner);
		// A slower rebuild for an older logo must not replace a newer one.
		if rebuilt.logo_generation() >= slides.logo_generation() {
			*slides = Arc::new(rebuilt);
		}
		Ok(())
	}

	/// Starts an export in the background. Returns false, changing nothing,
	/// when one is already running.
	pub fn start_export(self: &Arc<Self>) -> bool {
		let Some(episode) = self.pipeline.begin() else {
			return false;
		};

		let session = Arc::clone(self);
		let slides = self.slides();
		let surface = (self.surfaces)();

		tokio::spawn(async move {
			let assembler = LopdfAssembler::new(SLIDE_PAGE, Orientation::Landscape);
			session
				.pipeline
				.run_episode(episode, slides, surface, assembler)
				.await;
		});

		true
	}

	pub fn download_path(&self, file: &str) -> Option<PathBuf> {
		self.downloads.path_for(file)
	}

	pub fn render_viewer(&self) -> Result<String> {
		let logo_src = self.logo_src();
		let state = self.export_state();
		self.engine.render_viewer(&ViewerContext {
			index: self.index(),
			logo_src: logo_src.as_deref(),
			exporting: state.is_running(),
			progress: state.progress(),
		})
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		let (index, label, first, last) = {
			let nav = lock(&self.navigation);
			(nav.index(), nav.label(), nav.is_first(), nav.is_last())
		};

		let logo = self.logo();
		let kind = match &logo {
			LogoReference::Default(_) => "default",
			LogoReference::Uploaded { .. } => "uploaded",
			LogoReference::None => "none",
		};

		SessionSnapshot {
			index,
			total: TOTAL_SLIDES,
			label,
			first,
			last,
			logo: LogoStatus {
				kind,
				name: (!logo.is_none()).then(|| logo.describe()),
				src: self.logo_src(),
			},
			export: self.export_state(),
			notice: self.notices.latest(),
			download: self.downloads.latest(),
		}
	}
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use crate::error::{ExportError, Result as ExportResult};
	use crate::export::capture::{CaptureOptions, RasterImage, Readiness};
	use crate::export::FAILURE_MESSAGE;
	use image::{Rgba, RgbaImage};
	use std::time::Duration;

	/// Renders solid frames; fails at `fail_at` when set.
	pub(crate) struct SolidSurface {
		pub fail_at: Option<usize>,
	}

	impl CaptureSurface for SolidSurface {
		fn mount(&mut self, _slides: &OffscreenSlideSet, _options: &CaptureOptions) -> ExportResult<()> {
			Ok(())
		}

		fn present(&mut self, _index: usize, _await_signal: bool) -> ExportResult<Readiness> {
			Ok(Readiness::Signalled)
		}

		fn capture(&mut self, index: usize, _options: &CaptureOptions) -> ExportResult<RasterImage> {
			if self.fail_at == Some(index) {
				return Err(ExportError::Capture {
					index,
					reason: "forced".to_string(),
				});
			}
			Ok(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])))
		}

		fn unmount(&mut self) {}
	}

	pub(crate) fn session_with(dir: &Path, fail_at: Option<usize>) -> Arc<DeckSession> {
		let mut config = Config::default();
		config.deck.logo = PathBuf::new();
		config.export.output_dir = dir.to_path_buf();
		let surfaces: SurfaceFactory =
			Arc::new(move || Box::new(SolidSurface { fail_at }) as Box<dyn CaptureSurface>);
		DeckSession::with_surfaces(&config, surfaces).unwrap()
	}

	pub(crate) async fn wait_idle(session: &DeckSession) {
		for _ in 0..500 {
			if !session.export_state().is_running() {
				return;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		panic!("export did not finish");
	}

	#[test]
	fn test_logo_change_rebuilds_slide_set() {
		let dir = tempfile::tempdir().unwrap();
		let session = session_with(dir.path(), None);
		let before = session.slides();
		assert_eq!(session.logo_src(), None);

		session
			.set_logo(LogoFile {
				file_name: Some("brand.png".to_string()),
				content_type: "image/png".to_string(),
				bytes: b"brand".to_vec(),
			})
			.unwrap();

		let after = session.slides();
		assert!(!Arc::ptr_eq(&before, &after));
		assert_eq!(after.logo_generation(), 1);
		assert_eq!(session.logo_src().as_deref(), Some("/logo?v=1"));
		assert!(after.documents().iter().all(|d| d.html.contains("class=\"print-logo\"")));

		let snapshot = session.snapshot();
		assert_eq!(snapshot.logo.kind, "uploaded");
		assert_eq!(snapshot.logo.name.as_deref(), Some("brand.png"));

		session.clear_logo().unwrap();
		assert_eq!(session.snapshot().logo.kind, "none");
		assert_eq!(session.slides().logo_generation(), 2);
	}

	#[test]
	fn test_reload_default_logo_ignores_other_references() {
		let dir = tempfile::tempdir().unwrap();
		let session = session_with(dir.path(), None);
		assert!(!session.reload_default_logo(Path::new("talentlyx-logo.png")).unwrap());
		assert_eq!(session.slides().logo_generation(), 0);
	}

	#[tokio::test]
	async fn test_export_records_download() {
		let dir = tempfile::tempdir().unwrap();
		let session = session_with(dir.path(), None);

		assert!(session.start_export());
		assert!(!session.start_export());
		wait_idle(&session).await;

		let snapshot = session.snapshot();
		assert_eq!(snapshot.export, ExportState::Idle);
		assert!(snapshot.notice.is_none());
		let download = snapshot.download.unwrap();
		assert_eq!(download.url, format!("/download/{}", EXPORT_FILE_NAME));
		assert!(session.download_path(EXPORT_FILE_NAME).is_some());
		assert!(session.download_path("../secret").is_none());
	}

	#[tokio::test]
	async fn test_failed_export_posts_notice() {
		let dir = tempfile::tempdir().unwrap();
		let session = session_with(dir.path(), Some(3));

		assert!(session.start_export());
		wait_idle(&session).await;

		let snapshot = session.snapshot();
		assert_eq!(snapshot.notice.unwrap().message, FAILURE_MESSAGE);
		assert!(snapshot.download.is_none());
		assert!(session.download_path(EXPORT_FILE_NAME).is_none());
	}
}
