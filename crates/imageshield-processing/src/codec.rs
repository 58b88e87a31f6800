//! Decoding user uploads and encoding downloadable results

use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

use crate::error::ProcessingError;

/// Decode a JPEG or PNG upload held fully in memory.
pub fn decode(data: &[u8], max_bytes: usize) -> Result<DynamicImage, ProcessingError> {
    if data.is_empty() {
        return Err(ProcessingError::EmptyInput);
    }
    if data.len() > max_bytes {
        return Err(ProcessingError::InputTooLarge {
            size: data.len(),
            limit: max_bytes,
        });
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ProcessingError::Decode(e.to_string()))?;

    match reader.format() {
        Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) => {}
        _ => return Err(ProcessingError::UnsupportedFormat),
    }

    reader
        .decode()
        .map_err(|e| ProcessingError::Decode(e.to_string()))
}

/// Encode an image as PNG. The output never carries EXIF data.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, ProcessingError> {
    let estimated_size = (image.width() * image.height() * 3) as usize;
    let mut buffer = Vec::with_capacity(estimated_size);
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn create_test_png() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([10, 20, 30])));
        encode_png(&img).unwrap()
    }

    #[test]
    fn test_decode_png() {
        let data = create_test_png();
        let img = decode(&data, 1024 * 1024).unwrap();
        assert_eq!(img.dimensions(), (40, 30));
    }

    #[test]
    fn test_decode_rejects_empty_input() {
        assert!(matches!(decode(&[], 1024), Err(ProcessingError::EmptyInput)));
    }

    #[test]
    fn test_decode_rejects_oversized_input() {
        let data = create_test_png();
        let result = decode(&data, 10);
        assert!(matches!(
            result,
            Err(ProcessingError::InputTooLarge { limit: 10, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode(b"not an image", 1024);
        assert!(result.is_err());
    }

    #[test]
    fn test_encode_png_signature() {
        let data = create_test_png();
        assert_eq!(&data[0..8], b"\x89PNG\r\n\x1a\n");
    }
}
