//! Slide rasterization.
//!
//! A [`CaptureSurface`] mounts the whole off-screen set once per export,
//! presents one slide at a time, and captures it to an RGBA raster. The
//! production surface drives headless Chrome through `headless_chrome`.

use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::{Emulation, Page, DOM};
use headless_chrome::{Browser, LaunchOptions};
use image::{Rgb, RgbaImage};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ExportError, Result};
use crate::export::pdf::SLIDE_PAGE;
use crate::offscreen::OffscreenSlideSet;

pub type RasterImage = RgbaImage;

#[derive(Debug, Clone)]
pub struct CaptureOptions {
	/// Device pixels per page unit.
	pub scale: f64,
	/// Let embedded images load from other origins.
	pub allow_cross_origin: bool,
	/// Fill painted beneath transparent regions.
	pub background: Rgb<u8>,
	/// Emit per-slide diagnostics.
	pub logging: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
	/// The document reported that its fonts and images finished loading.
	Signalled,
	/// No signal was requested or available; the caller should settle.
	Unknown,
}

pub trait CaptureSurface: Send {
	/// Lays out every document of the set. Called once per export.
	fn mount(&mut self, slides: &OffscreenSlideSet, options: &CaptureOptions) -> Result<()>;

	/// Brings one slide into the capture viewport. With `await_signal`, blocks
	/// until the document reports its assets loaded.
	fn present(&mut self, index: usize, await_signal: bool) -> Result<Readiness>;

	fn capture(&mut self, index: usize, options: &CaptureOptions) -> Result<RasterImage>;

	/// Hides the set again. Must be safe to call after a failed mount.
	fn unmount(&mut self);
}

impl<T: CaptureSurface + ?Sized> CaptureSurface for Box<T> {
	fn mount(&mut self, slides: &OffscreenSlideSet, options: &CaptureOptions) -> Result<()> {
		(**self).mount(slides, options)
	}

	fn present(&mut self, index: usize, await_signal: bool) -> Result<Readiness> {
		(**self).present(index, await_signal)
	}

	fn capture(&mut self, index: usize, options: &CaptureOptions) -> Result<RasterImage> {
		(**self).capture(index, options)
	}

	fn unmount(&mut self) {
		(**self).unmount()
	}
}

const READY_SCRIPT: &str = r#"
(async function() {
	if (document.readyState !== 'complete') {
		await new Promise(function(resolve) { window.addEventListener('load', resolve, { once: true }); });
	}
	await document.fonts.ready;
	await Promise.all(Array.from(document.images).map(function(img) {
		if (img.complete) return null;
		return new Promise(function(resolve) { img.onload = resolve; img.onerror = resolve; });
	}));
	return true;
})()
"#;

fn document_url(path: &Path) -> Result<String> {
	Url::from_file_path(path)
		.map(String::from)
		.map_err(|_| ExportError::MissingCaptureTarget(format!("{} is not an absolute path", path.display())))
}

struct ChromeSession {
	// Kept alive for as long as the tab is in use.
	_browser: Browser,
	tab: Arc<Tab>,
}

/// Headless Chrome capture. The browser is launched on mount and shut down
/// on unmount; slide documents are staged as files for the duration.
pub struct ChromeSurface {
	chrome_path: Option<PathBuf>,
	session: Option<ChromeSession>,
	staging: Option<PathBuf>,
	documents: Vec<PathBuf>,
}

impl ChromeSurface {
	pub fn new(chrome_path: Option<PathBuf>) -> Self {
		Self {
			chrome_path,
			session: None,
			staging: None,
			documents: Vec::new(),
		}
	}

	fn launch(&self, options: &CaptureOptions) -> Result<ChromeSession> {
		let mut args: Vec<&OsStr> = vec![OsStr::new("--hide-scrollbars")];
		if options.allow_cross_origin {
			args.push(OsStr::new("--disable-web-security"));
			args.push(OsStr::new("--allow-file-access-from-files"));
		}

		let launch_options = LaunchOptions::default_builder()
			.headless(true)
			.window_size(Some((SLIDE_PAGE.width as u32, SLIDE_PAGE.height as u32)))
			.path(self.chrome_path.clone())
			.args(args)
			.build()
			.map_err(|e| ExportError::MissingCaptureTarget(format!("invalid browser options: {}", e)))?;

		let browser = Browser::new(launch_options)
			.map_err(|e| ExportError::MissingCaptureTarget(format!("browser unavailable: {}", e)))?;
		let tab = browser
			.new_tab()
			.map_err(|e| ExportError::MissingCaptureTarget(format!("failed to open tab: {}", e)))?;

		let background = options.background;
		tab.call_method(Emulation::SetDefaultBackgroundColorOverride {
			color: Some(DOM::RGBA {
				r: background[0] as u32,
				g: background[1] as u32,
				b: background[2] as u32,
				a: Some(1.0),
			}),
		})
		.map_err(|e| ExportError::MissingCaptureTarget(format!("failed to set background: {}", e)))?;

		Ok(ChromeSession {
			_browser: browser,
			tab,
		})
	}

	fn tab(&self) -> Result<&Arc<Tab>> {
		self.session
			.as_ref()
			.map(|s| &s.tab)
			.ok_or_else(|| ExportError::MissingCaptureTarget("surface is not mounted".to_string()))
	}
}

impl CaptureSurface for ChromeSurface {
	fn mount(&mut self, slides: &OffscreenSlideSet, options: &CaptureOptions) -> Result<()> {
		let staging = std::env::temp_dir().join(format!(
			"pitchdeck-{}-{}",
			std::process::id(),
			slides.logo_generation()
		));
		fs::create_dir_all(&staging).map_err(|e| {
			ExportError::MissingCaptureTarget(format!("cannot stage {}: {}", staging.display(), e))
		})?;
		self.staging = Some(staging.clone());

		self.documents.clear();
		for doc in slides.documents() {
			let path = staging.join(format!("slide-{:02}.html", doc.index));
			fs::write(&path, &doc.html).map_err(|e| {
				ExportError::MissingCaptureTarget(format!("cannot stage {}: {}", path.display(), e))
			})?;
			if options.logging {
				debug!("Staged slide {} ({}) at {}", doc.index, doc.title, path.display());
			}
			self.documents.push(path);
		}

		self.session = Some(self.launch(options)?);
		debug!("Mounted {} slides in {}", self.documents.len(), staging.display());
		Ok(())
	}

	fn present(&mut self, index: usize, await_signal: bool) -> Result<Readiness> {
		let path = self.documents.get(index).ok_or_else(|| {
			ExportError::MissingCaptureTarget(format!("no staged document for slide {}", index))
		})?;
		let url = document_url(path)?;
		let tab = self.tab()?;

		tab.navigate_to(&url)
			.and_then(|t| t.wait_until_navigated())
			.map_err(|e| ExportError::Capture {
				index,
				reason: format!("navigation failed: {}", e),
			})?;

		if !await_signal {
			return Ok(Readiness::Unknown);
		}

		let result = tab.evaluate(READY_SCRIPT, true).map_err(|e| ExportError::Capture {
			index,
			reason: format!("readiness check failed: {}", e),
		})?;

		match result.value {
			Some(serde_json::Value::Bool(true)) => Ok(Readiness::Signalled),
			other => {
				warn!("Slide {} gave no readiness signal ({:?})", index, other);
				Ok(Readiness::Unknown)
			}
		}
	}

	fn capture(&mut self, index: usize, options: &CaptureOptions) -> Result<RasterImage> {
		let clip = Page::Viewport {
			x: 0.0,
			y: 0.0,
			width: SLIDE_PAGE.width as f64,
			height: SLIDE_PAGE.height as f64,
			scale: options.scale,
		};

		let png = self
			.tab()?
			.capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, Some(clip), true)
			.map_err(|e| ExportError::Capture {
				index,
				reason: e.to_string(),
			})?;

		let raster = image::load_from_memory(&png)
			.map_err(|e| ExportError::Capture {
				index,
				reason: format!("unreadable screenshot: {}", e),
			})?
			.to_rgba8();

		if options.logging {
			debug!(
				"Captured slide {} at {}x{} ({} bytes)",
				index,
				raster.width(),
				raster.height(),
				png.len()
			);
		}

		Ok(raster)
	}

	fn unmount(&mut self) {
		self.session = None;
		self.documents.clear();
		if let Some(staging) = self.staging.take() {
			if let Err(e) = fs::remove_dir_all(&staging) {
				warn!("Failed to remove {}: {}", staging.display(), e);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::logo::LogoReference;
	use crate::templates::TemplateEngine;

	fn options() -> CaptureOptions {
		CaptureOptions {
			scale: 2.0,
			allow_cross_origin: true,
			background: Rgb([0, 0, 0]),
			logging: true,
		}
	}

	#[test]
	fn test_unmounted_surface_has_no_target() {
		let mut surface = ChromeSurface::new(None);
		assert!(matches!(
			surface.present(0, false),
			Err(ExportError::MissingCaptureTarget(_))
		));
		surface.unmount();
	}

	#[test]
	#[cfg(unix)]
	fn test_document_url_is_percent_encoded() {
		let url = document_url(Path::new("/tmp/deck #1/slide 00.html")).unwrap();
		assert_eq!(url, "file:///tmp/deck%20%231/slide%2000.html");
		assert!(matches!(
			document_url(Path::new("relative/slide.html")),
			Err(ExportError::MissingCaptureTarget(_))
		));
	}

	#[test]
	#[ignore = "requires a local Chrome or Chromium"]
	fn test_capture_first_slide_with_chrome() {
		let set = OffscreenSlideSet::build(&TemplateEngine::new(), &LogoReference::None, 0).unwrap();
		let mut surface = ChromeSurface::new(None);
		surface.mount(&set, &options()).unwrap();
		surface.present(0, true).unwrap();
		let raster = surface.capture(0, &options()).unwrap();
		surface.unmount();
		assert_eq!(raster.dimensions(), (3840, 2160));
	}
}
