use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage, RgbaImage};

use crate::error::Result;

/// A compressed image ready to be placed on a page.
#[derive(Debug, Clone)]
pub struct EncodedImage {
	pub bytes: Vec<u8>,
	pub width: u32,
	pub height: u32,
	pub format: ImageFormat,
}

/// Converts a 0.0-1.0 quality factor into the encoder's 1-100 scale.
pub fn jpeg_quality(factor: f32) -> u8 {
	(factor.clamp(0.01, 1.0) * 100.0).round() as u8
}

/// Flattens `raster` onto an opaque background and encodes it as JPEG.
pub fn encode_jpeg(raster: &RgbaImage, background: Rgb<u8>, quality: u8) -> Result<EncodedImage> {
	let (width, height) = raster.dimensions();
	let mut flat = RgbImage::new(width, height);

	for (x, y, pixel) in raster.enumerate_pixels() {
		let alpha = pixel[3] as u32;
		let blend = |c: u8, bg: u8| ((c as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8;
		flat.put_pixel(
			x,
			y,
			Rgb([
				blend(pixel[0], background[0]),
				blend(pixel[1], background[1]),
				blend(pixel[2], background[2]),
			]),
		);
	}

	let mut bytes = Vec::new();
	JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(&flat)?;

	Ok(EncodedImage {
		bytes,
		width,
		height,
		format: ImageFormat::Jpeg,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::Rgba;

	#[test]
	fn test_quality_scale() {
		assert_eq!(jpeg_quality(0.9), 90);
		assert_eq!(jpeg_quality(1.5), 100);
		assert_eq!(jpeg_quality(0.0), 1);
	}

	#[test]
	fn test_transparent_regions_take_background() {
		let raster = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 0]));
		let encoded = encode_jpeg(&raster, Rgb([0, 0, 0]), 90).unwrap();
		assert_eq!((encoded.width, encoded.height), (16, 16));
		assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);

		let decoded = image::load_from_memory(&encoded.bytes).unwrap().to_rgb8();
		let pixel = decoded.get_pixel(8, 8);
		assert!(pixel.0.iter().all(|&c| c < 8), "expected black, got {:?}", pixel);
	}

	#[test]
	fn test_opaque_pixels_survive() {
		let raster = RgbaImage::from_pixel(16, 16, Rgba([240, 240, 240, 255]));
		let encoded = encode_jpeg(&raster, Rgb([0, 0, 0]), 90).unwrap();
		let decoded = image::load_from_memory(&encoded.bytes).unwrap().to_rgb8();
		assert!(decoded.get_pixel(4, 4).0.iter().all(|&c| c > 230));
	}
}
