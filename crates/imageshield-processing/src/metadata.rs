//! Metadata inspection
//!
//! Containers are handled with `img-parts`, EXIF fields are decoded with
//! `kamadak-exif`. Only JPEG and PNG carry metadata we care about.

use bytes::Bytes;
use image::{GenericImageView, ImageReader};
use img_parts::{jpeg::Jpeg, png::Png, ImageEXIF};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::error::ProcessingError;

/// One decoded EXIF field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExifField {
    pub tag: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub size_bytes: u64,
    pub exif_fields: Vec<ExifField>,
}

impl ImageMetadata {
    pub fn has_exif(&self) -> bool {
        !self.exif_fields.is_empty()
    }
}

/// Raw TIFF-structured EXIF payload of a JPEG or PNG, if any.
fn raw_exif(data: &[u8]) -> Option<Bytes> {
    let bytes = Bytes::copy_from_slice(data);
    if let Ok(jpeg) = Jpeg::from_bytes(bytes.clone()) {
        return jpeg.exif();
    }
    if let Ok(png) = Png::from_bytes(bytes) {
        return png.exif();
    }
    None
}

/// List the EXIF fields of an encoded image. Empty when there are none.
pub fn read_exif(data: &[u8]) -> Vec<ExifField> {
    let Some(raw) = raw_exif(data) else {
        return Vec::new();
    };

    match exif::Reader::new().read_raw(raw.to_vec()) {
        Ok(parsed) => parsed
            .fields()
            .map(|field| ExifField {
                tag: field.tag.to_string(),
                value: field.display_value().with_unit(&parsed).to_string(),
            })
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "EXIF block present but unreadable");
            Vec::new()
        }
    }
}

/// Dimensions, container format and EXIF fields of an encoded image.
pub fn describe(data: &[u8]) -> Result<ImageMetadata, ProcessingError> {
    if data.is_empty() {
        return Err(ProcessingError::EmptyInput);
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ProcessingError::Decode(e.to_string()))?;
    let format = reader
        .format()
        .map(|f| format!("{:?}", f))
        .unwrap_or_else(|| "unknown".to_string());
    let img = reader
        .decode()
        .map_err(|e| ProcessingError::Decode(e.to_string()))?;
    let (width, height) = img.dimensions();

    Ok(ImageMetadata {
        width,
        height,
        format,
        size_bytes: data.len() as u64,
        exif_fields: read_exif(data),
    })
}
