use image::ImageFormat;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{ExportError, Result};
use crate::export::raster::EncodedImage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
	pub width: f32,
	pub height: f32,
}

/// 16:9 slide page, in PDF user units.
pub const SLIDE_PAGE: PageSize = PageSize {
	width: 1920.0,
	height: 1080.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
	Landscape,
	#[allow(dead_code)]
	Portrait,
}

impl PageSize {
	fn oriented(self, orientation: Orientation) -> Self {
		let (long, short) = if self.width >= self.height {
			(self.width, self.height)
		} else {
			(self.height, self.width)
		};
		match orientation {
			Orientation::Landscape => PageSize { width: long, height: short },
			Orientation::Portrait => PageSize { width: short, height: long },
		}
	}
}

/// Accumulates pages in append order. A new assembler starts with one empty
/// page; `add_page` appends further pages and images always land on the
/// most recent one.
pub trait PageAssembler: Send {
	fn add_page(&mut self, size: PageSize) -> Result<()>;

	/// Places `image` at `(x, y)` measured from the top-left corner.
	fn add_image(&mut self, image: &EncodedImage, x: f32, y: f32, width: f32, height: f32) -> Result<()>;

	fn page_count(&self) -> usize;

	/// Serializes the finished document.
	fn finish(self) -> Result<Vec<u8>>
	where
		Self: Sized;
}

struct Placement {
	name: String,
	xobject: ObjectId,
	x: f32,
	y: f32,
	width: f32,
	height: f32,
}

struct PendingPage {
	size: PageSize,
	placements: Vec<Placement>,
}

pub struct LopdfAssembler {
	doc: Document,
	pages_id: ObjectId,
	orientation: Orientation,
	pages: Vec<PendingPage>,
	image_count: usize,
}

impl LopdfAssembler {
	pub fn new(size: PageSize, orientation: Orientation) -> Self {
		let mut doc = Document::with_version("1.5");
		let pages_id = doc.new_object_id();

		Self {
			doc,
			pages_id,
			orientation,
			pages: vec![PendingPage {
				size: size.oriented(orientation),
				placements: Vec::new(),
			}],
			image_count: 0,
		}
	}

	fn page_object(&mut self, page: PendingPage) -> Result<ObjectId> {
		let mut operations = Vec::new();
		let mut xobjects = Dictionary::new();

		for placement in &page.placements {
			// PDF space starts at the bottom-left corner.
			let bottom = page.size.height - placement.y - placement.height;
			operations.push(Operation::new("q", vec![]));
			operations.push(Operation::new(
				"cm",
				vec![
					placement.width.into(),
					0i64.into(),
					0i64.into(),
					placement.height.into(),
					placement.x.into(),
					bottom.into(),
				],
			));
			operations.push(Operation::new(
				"Do",
				vec![Object::Name(placement.name.as_bytes().to_vec())],
			));
			operations.push(Operation::new("Q", vec![]));
			xobjects.set(placement.name.as_bytes().to_vec(), placement.xobject);
		}

		let content = Content { operations }.encode()?;
		let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));

		Ok(self.doc.add_object(dictionary! {
			"Type" => "Page",
			"Parent" => self.pages_id,
			"MediaBox" => vec![0i64.into(), 0i64.into(), page.size.width.into(), page.size.height.into()],
			"Contents" => content_id,
			"Resources" => dictionary! {
				"XObject" => xobjects,
			},
		}))
	}
}

impl PageAssembler for LopdfAssembler {
	fn add_page(&mut self, size: PageSize) -> Result<()> {
		self.pages.push(PendingPage {
			size: size.oriented(self.orientation),
			placements: Vec::new(),
		});
		Ok(())
	}

	fn add_image(&mut self, image: &EncodedImage, x: f32, y: f32, width: f32, height: f32) -> Result<()> {
		if image.format != ImageFormat::Jpeg {
			return Err(ExportError::Assemble(format!(
				"unsupported image format {:?}",
				image.format
			)));
		}

		let stream = Stream::new(
			dictionary! {
				"Type" => "XObject",
				"Subtype" => "Image",
				"Width" => image.width as i64,
				"Height" => image.height as i64,
				"ColorSpace" => "DeviceRGB",
				"BitsPerComponent" => 8i64,
				"Filter" => "DCTDecode",
			},
			image.bytes.clone(),
		)
		.with_compression(false);
		let xobject = self.doc.add_object(stream);

		let name = format!("Im{}", self.image_count);
		self.image_count += 1;

		let page = self
			.pages
			.last_mut()
			.ok_or_else(|| ExportError::Assemble("document has no pages".to_string()))?;
		page.placements.push(Placement {
			name,
			xobject,
			x,
			y,
			width,
			height,
		});
		Ok(())
	}

	fn page_count(&self) -> usize {
		self.pages.len()
	}

	fn finish(mut self) -> Result<Vec<u8>> {
		let pages = std::mem::take(&mut self.pages);
		let count = pages.len() as i64;

		let mut kids = Vec::with_capacity(pages.len());
		for page in pages {
			kids.push(Object::Reference(self.page_object(page)?));
		}

		self.doc.objects.insert(
			self.pages_id,
			Object::Dictionary(dictionary! {
				"Type" => "Pages",
				"Kids" => kids,
				"Count" => count,
			}),
		);

		let catalog_id = self.doc.add_object(dictionary! {
			"Type" => "Catalog",
			"Pages" => self.pages_id,
		});
		self.doc.trailer.set("Root", catalog_id);

		let mut bytes = Vec::new();
		self.doc
			.save_to(&mut bytes)
			.map_err(|e| ExportError::Assemble(e.to_string()))?;
		Ok(bytes)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::export::raster::encode_jpeg;
	use image::{Rgb, Rgba, RgbaImage};

	fn jpeg() -> EncodedImage {
		encode_jpeg(&RgbaImage::from_pixel(8, 4, Rgba([10, 20, 30, 255])), Rgb([0, 0, 0]), 90).unwrap()
	}

	fn media_box(doc: &Document, page: ObjectId) -> Vec<f32> {
		doc.get_object(page)
			.unwrap()
			.as_dict()
			.unwrap()
			.get(b"MediaBox")
			.unwrap()
			.as_array()
			.unwrap()
			.iter()
			.map(|v| v.as_float().unwrap())
			.collect()
	}

	#[test]
	fn test_initial_page_is_not_appended() {
		let mut assembler = LopdfAssembler::new(SLIDE_PAGE, Orientation::Landscape);
		assert_eq!(assembler.page_count(), 1);

		assembler.add_image(&jpeg(), 0.0, 0.0, 1920.0, 1080.0).unwrap();
		assembler.add_page(SLIDE_PAGE).unwrap();
		assembler.add_image(&jpeg(), 0.0, 0.0, 1920.0, 1080.0).unwrap();

		let bytes = assembler.finish().unwrap();
		let doc = Document::load_mem(&bytes).unwrap();
		let pages = doc.get_pages();
		assert_eq!(pages.len(), 2);
		for (_, id) in pages {
			assert_eq!(media_box(&doc, id), vec![0.0, 0.0, 1920.0, 1080.0]);
		}
	}

	#[test]
	fn test_orientation_normalizes_size() {
		let portrait = PageSize {
			width: 1080.0,
			height: 1920.0,
		};
		let assembler = LopdfAssembler::new(portrait, Orientation::Landscape);
		let bytes = assembler.finish().unwrap();
		let doc = Document::load_mem(&bytes).unwrap();
		let (_, id) = doc.get_pages().into_iter().next().unwrap();
		assert_eq!(media_box(&doc, id), vec![0.0, 0.0, 1920.0, 1080.0]);
	}

	#[test]
	fn test_portrait_swaps_axes() {
		let assembler = LopdfAssembler::new(SLIDE_PAGE, Orientation::Portrait);
		let bytes = assembler.finish().unwrap();
		let doc = Document::load_mem(&bytes).unwrap();
		let (_, id) = doc.get_pages().into_iter().next().unwrap();
		assert_eq!(media_box(&doc, id), vec![0.0, 0.0, 1080.0, 1920.0]);
	}

	#[test]
	fn test_rejects_non_jpeg() {
		let mut assembler = LopdfAssembler::new(SLIDE_PAGE, Orientation::Landscape);
		let mut image = jpeg();
		image.format = ImageFormat::Png;
		assert!(matches!(
			assembler.add_image(&image, 0.0, 0.0, 1.0, 1.0),
			Err(ExportError::Assemble(_))
		));
	}
}
