use thiserror::Error;

/// Failures that end an export episode.
#[derive(Debug, Error)]
pub enum ExportError {
	#[error("capture target missing: {0}")]
	MissingCaptureTarget(String),

	#[error("capture of slide {index} failed: {reason}")]
	Capture { index: usize, reason: String },

	#[error("image encoding failed: {0}")]
	Encode(String),

	#[error("PDF assembly failed: {0}")]
	Assemble(String),

	#[error("saving {file} failed: {source}")]
	Save {
		file: String,
		#[source]
		source: std::io::Error,
	},

	#[error("export task aborted: {0}")]
	Task(String),
}

impl From<image::ImageError> for ExportError {
	fn from(e: image::ImageError) -> Self {
		ExportError::Encode(e.to_string())
	}
}

impl From<lopdf::Error> for ExportError {
	fn from(e: lopdf::Error) -> Self {
		ExportError::Assemble(e.to_string())
	}
}

impl From<tokio::task::JoinError> for ExportError {
	fn from(e: tokio::task::JoinError) -> Self {
		ExportError::Task(e.to_string())
	}
}

pub type Result<T> = std::result::Result<T, ExportError>;
