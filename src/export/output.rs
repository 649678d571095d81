use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ExportError, Result};

/// Receives the finished document, like a browser download would.
pub trait DocumentSink: Send + Sync {
	fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// User-visible notification of a failed export.
pub trait Notifier: Send + Sync {
	fn notify_failure(&self, message: &str);
}

/// Writes documents into a directory, creating it on first use.
pub struct DirectorySink {
	dir: PathBuf,
}

impl DirectorySink {
	pub fn new(dir: &Path) -> Self {
		Self {
			dir: dir.to_path_buf(),
		}
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}
}

impl DocumentSink for DirectorySink {
	fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
		let path = self.dir.join(file_name);
		fs::create_dir_all(&self.dir)
			.and_then(|_| fs::write(&path, bytes))
			.map_err(|source| ExportError::Save {
				file: path.display().to_string(),
				source,
			})?;
		Ok(path)
	}
}

/// Prints failures for the command line.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
	fn notify_failure(&self, message: &str) {
		eprintln!("{}", message);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_directory_sink_creates_dir() {
		let dir = tempfile::tempdir().unwrap();
		let sink = DirectorySink::new(&dir.path().join("dist"));
		let path = sink.save("deck.pdf", b"%PDF-1.5").unwrap();
		assert_eq!(path, dir.path().join("dist").join("deck.pdf"));
		assert_eq!(fs::read(path).unwrap(), b"%PDF-1.5");
	}

	#[test]
	fn test_directory_sink_reports_failures() {
		let dir = tempfile::tempdir().unwrap();
		let blocker = dir.path().join("file");
		fs::write(&blocker, b"").unwrap();

		let sink = DirectorySink::new(&blocker);
		assert!(matches!(
			sink.save("deck.pdf", b""),
			Err(ExportError::Save { .. })
		));
	}
}
