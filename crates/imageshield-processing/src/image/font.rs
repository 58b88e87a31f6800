//! Font resolution for watermark text
//!
//! A configured TrueType file wins, then a handful of well-known system
//! fonts, then the 8x8 bitmap font compiled into the binary. Resolution
//! never fails.

use ab_glyph::FontVec;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{imageops, GrayImage, Luma};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ProcessingError;

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Side of a glyph cell in the builtin font.
const BUILTIN_CELL: u32 = 8;

pub enum WatermarkFont {
    TrueType { font: FontVec, source: PathBuf },
    Builtin,
}

impl fmt::Debug for WatermarkFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatermarkFont::TrueType { source, .. } => {
                f.debug_struct("TrueType").field("source", source).finish()
            }
            WatermarkFont::Builtin => f.write_str("Builtin"),
        }
    }
}

impl WatermarkFont {
    pub fn from_file(path: &Path) -> Result<Self, ProcessingError> {
        let data = std::fs::read(path)
            .map_err(|e| ProcessingError::Decode(format!("font {}: {}", path.display(), e)))?;
        let font = FontVec::try_from_vec(data)
            .map_err(|e| ProcessingError::Decode(format!("font {}: {}", path.display(), e)))?;
        Ok(WatermarkFont::TrueType {
            font,
            source: path.to_path_buf(),
        })
    }

    /// Resolve the font to draw with, falling back silently.
    pub fn load(preferred: Option<&Path>) -> Self {
        if let Some(path) = preferred {
            match Self::from_file(path) {
                Ok(font) => return font,
                Err(e) => tracing::warn!(error = %e, "Configured font unusable, falling back"),
            }
        }

        for candidate in SYSTEM_FONTS {
            let path = Path::new(candidate);
            if path.is_file() {
                if let Ok(font) = Self::from_file(path) {
                    tracing::debug!(font = %path.display(), "Using system font");
                    return font;
                }
            }
        }

        tracing::debug!("No TrueType font found, using builtin bitmap font");
        WatermarkFont::Builtin
    }

    /// Coverage mask of `text` at `size` pixels, cropped to the inked
    /// pixels. Empty when nothing is inked.
    pub fn render(&self, size: f32, text: &str) -> GrayImage {
        let (width, height) = self.advance_box(size, text);
        if width == 0 || height == 0 {
            return GrayImage::new(0, 0);
        }

        // Outlines may reach past the advance box on any side.
        let pad = size.ceil().max(1.0) as u32;
        let mut canvas = GrayImage::new(width + 2 * pad, height + 2 * pad);
        let ink = Luma([u8::MAX]);
        match self {
            WatermarkFont::TrueType { font, .. } => {
                draw_text_mut(&mut canvas, ink, pad as i32, pad as i32, size, font, text)
            }
            WatermarkFont::Builtin => draw_builtin(&mut canvas, ink, pad as i32, pad as i32, size, text),
        }
        crop_to_ink(&canvas)
    }

    /// Pen advance and line height of `text`, before cropping.
    fn advance_box(&self, size: f32, text: &str) -> (u32, u32) {
        match self {
            WatermarkFont::TrueType { font, .. } => text_size(size, font, text),
            WatermarkFont::Builtin => {
                let glyphs = text.chars().count() as u32;
                if glyphs == 0 {
                    return (0, 0);
                }
                let cell = BUILTIN_CELL * builtin_scale(size);
                (glyphs * cell, cell)
            }
        }
    }
}

fn crop_to_ink(canvas: &GrayImage) -> GrayImage {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in canvas.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    match bounds {
        Some((x0, y0, x1, y1)) => imageops::crop_imm(canvas, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image(),
        None => GrayImage::new(0, 0),
    }
}

/// Integer upscale of the 8x8 cells that best approximates `size`.
fn builtin_scale(size: f32) -> u32 {
    ((size / BUILTIN_CELL as f32) as u32).max(1)
}

fn draw_builtin(canvas: &mut GrayImage, color: Luma<u8>, x: i32, y: i32, size: f32, text: &str) {
    let scale = builtin_scale(size);
    let cell = (BUILTIN_CELL * scale) as i32;

    for (index, ch) in text.chars().enumerate() {
        let Some(rows) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            continue;
        };
        let origin_x = x + index as i32 * cell;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..BUILTIN_CELL {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = origin_x + (col * scale) as i32;
                let py = y + row as i32 * scale as i32;
                draw_filled_rect_mut(canvas, Rect::at(px, py).of_size(scale, scale), color);
            }
        }
    }
}
