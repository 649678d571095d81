use anyhow::Result;

use crate::logo::LogoReference;
use crate::slides::{self, TOTAL_SLIDES};
use crate::templates::TemplateEngine;

/// One standalone print document, ready for capture.
#[derive(Debug, Clone)]
pub struct SlideDocument {
	pub index: usize,
	pub title: &'static str,
	pub html: String,
}

/// Pre-rendered print documents for every slide.
///
/// The set is immutable. A logo change produces a new set, so an export
/// holding an older one keeps a single logo across all of its pages.
#[derive(Debug, Clone)]
pub struct OffscreenSlideSet {
	documents: Vec<SlideDocument>,
	logo_generation: u64,
}

impl OffscreenSlideSet {
	pub fn build(engine: &TemplateEngine, logo: &LogoReference, logo_generation: u64) -> Result<Self> {
		let logo_src = logo.resolve_inline();

		let documents = slides::all()
			.iter()
			.enumerate()
			.map(|(index, slide)| {
				Ok(SlideDocument {
					index,
					title: slide.title,
					html: engine.render_print(index, logo_src.as_deref())?,
				})
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(Self {
			documents,
			logo_generation,
		})
	}

	#[cfg(test)]
	pub fn from_documents(documents: Vec<SlideDocument>, logo_generation: u64) -> Self {
		Self {
			documents,
			logo_generation,
		}
	}

	pub fn documents(&self) -> &[SlideDocument] {
		&self.documents
	}

	#[cfg(test)]
	pub fn get(&self, index: usize) -> Option<&SlideDocument> {
		self.documents.get(index)
	}

	pub fn len(&self) -> usize {
		self.documents.len()
	}

	/// True when every slide has a document, in order.
	pub fn is_complete(&self) -> bool {
		self.documents.len() == TOTAL_SLIDES
			&& self.documents.iter().enumerate().all(|(i, d)| d.index == i)
	}

	pub fn logo_generation(&self) -> u64 {
		self.logo_generation
	}
}
