use base64::Engine as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Content types advertised to the browser file picker. Uploads are not
/// checked against this list.
pub const ACCEPTED_CONTENT_TYPES: &str = "image/png, image/jpeg, image/svg+xml";

/// A user-selected logo file.
#[derive(Debug, Clone)]
pub struct LogoFile {
	pub file_name: Option<String>,
	pub content_type: String,
	pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoReference {
	/// Logo shipped alongside the deck, read from disk when rendered.
	Default(PathBuf),
	/// Uploaded during the session. The bytes are dropped when replaced.
	Uploaded {
		file_name: Option<String>,
		content_type: String,
		bytes: Arc<[u8]>,
	},
	None,
}

impl LogoReference {
	pub fn is_none(&self) -> bool {
		matches!(self, LogoReference::None)
	}

	/// Short description for status reporting.
	pub fn describe(&self) -> String {
		match self {
			LogoReference::Default(path) => path.display().to_string(),
			LogoReference::Uploaded { file_name, .. } => {
				file_name.clone().unwrap_or_else(|| "uploaded logo".to_string())
			}
			LogoReference::None => "none".to_string(),
		}
	}

	/// Returns the logo bytes and their content type.
	pub fn load(&self) -> Option<(String, Vec<u8>)> {
		match self {
			LogoReference::Default(path) => match fs::read(path) {
				Ok(bytes) => Some((content_type_for(path).to_string(), bytes)),
				Err(e) => {
					warn!("Default logo {} unavailable: {}", path.display(), e);
					None
				}
			},
			LogoReference::Uploaded {
				content_type, bytes, ..
			} => Some((content_type.clone(), bytes.to_vec())),
			LogoReference::None => None,
		}
	}

	/// Renders the logo as a `data:` URI so standalone documents can embed it
	/// without a server.
	pub fn resolve_inline(&self) -> Option<String> {
		let (content_type, bytes) = self.load()?;
		let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
		Some(format!("data:{};base64,{}", content_type, encoded))
	}
}

fn content_type_for(path: &Path) -> &'static str {
	match path
		.extension()
		.and_then(|e| e.to_str())
		.map(|e| e.to_ascii_lowercase())
		.as_deref()
	{
		Some("png") => "image/png",
		Some("jpg" | "jpeg") => "image/jpeg",
		Some("svg") => "image/svg+xml",
		Some("gif") => "image/gif",
		Some("webp") => "image/webp",
		_ => "application/octet-stream",
	}
}

#[derive(Debug, Clone)]
pub struct LogoAssetManager {
	current: LogoReference,
	generation: u64,
}

impl LogoAssetManager {
	pub fn new(default: Option<&Path>) -> Self {
		let current = match default {
			Some(path) => LogoReference::Default(path.to_path_buf()),
			None => LogoReference::None,
		};
		Self {
			current,
			generation: 0,
		}
	}

	pub fn current(&self) -> &LogoReference {
		&self.current
	}

	/// Incremented on every replacement; rendered documents record the
	/// generation they were built with.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Replaces the current logo with the uploaded file, whatever it contains.
	pub fn set_logo(&mut self, file: LogoFile) {
		self.replace(LogoReference::Uploaded {
			file_name: file.file_name,
			content_type: file.content_type,
			bytes: file.bytes.into(),
		});
	}

	pub fn clear(&mut self) {
		self.replace(LogoReference::None);
	}

	/// Marks the default logo as changed on disk. Returns false when the
	/// default is not the active reference.
	pub fn touch_default(&mut self, path: &Path) -> bool {
		match &self.current {
			LogoReference::Default(current) if current == path => {
				self.generation += 1;
				true
			}
			_ => false,
		}
	}

	fn replace(&mut self, next: LogoReference) {
		self.current = next;
		self.generation += 1;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn upload(name: &str, bytes: &[u8]) -> LogoFile {
		LogoFile {
			file_name: Some(name.to_string()),
			content_type: "image/png".to_string(),
			bytes: bytes.to_vec(),
		}
	}

	#[test]
	fn test_starts_with_default() {
		let manager = LogoAssetManager::new(Some(Path::new("talentlyx-logo.png")));
		assert_eq!(
			manager.current(),
			&LogoReference::Default(PathBuf::from("talentlyx-logo.png"))
		);
		assert_eq!(manager.generation(), 0);

		assert!(LogoAssetManager::new(None).current().is_none());
	}

	#[test]
	fn test_set_logo_replaces_unconditionally() {
		let mut manager = LogoAssetManager::new(None);
		manager.set_logo(upload("a.png", b"first"));
		manager.set_logo(upload("b.png", b"second"));

		assert_eq!(manager.generation(), 2);
		assert_eq!(manager.current().describe(), "b.png");
		let (_, bytes) = manager.current().load().unwrap();
		assert_eq!(bytes, b"second");
	}

	#[test]
	fn test_mismatched_content_is_accepted() {
		let mut manager = LogoAssetManager::new(None);
		manager.set_logo(LogoFile {
			file_name: Some("notes.txt".to_string()),
			content_type: "text/plain".to_string(),
			bytes: b"not an image".to_vec(),
		});
		assert!(manager.current().resolve_inline().unwrap().starts_with("data:text/plain;base64,"));
	}

	#[test]
	fn test_inline_default_from_disk() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("logo.SVG");
		fs::write(&path, "<svg/>").unwrap();

		let manager = LogoAssetManager::new(Some(&path));
		assert_eq!(
			manager.current().resolve_inline().unwrap(),
			"data:image/svg+xml;base64,PHN2Zy8+"
		);

		let missing = LogoReference::Default(dir.path().join("missing.png"));
		assert!(missing.resolve_inline().is_none());
	}

	#[test]
	fn test_touch_default_only_when_active() {
		let mut manager = LogoAssetManager::new(Some(Path::new("logo.png")));
		assert!(manager.touch_default(Path::new("logo.png")));
		assert_eq!(manager.generation(), 1);

		manager.clear();
		assert!(!manager.touch_default(Path::new("logo.png")));
		assert_eq!(manager.generation(), 2);
	}
}
