//! SafeShare: metadata-free copy plus a text watermark

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageshield_core::constants::{
    DEFAULT_WATERMARK_OPACITY, DEFAULT_WATERMARK_TEXT, MAX_WATERMARK_ANGLE,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, instrument};

use crate::image::font::WatermarkFont;

/// Distance kept between the text and the image edges.
pub const WATERMARK_MARGIN: i32 = 10;

/// Layer colour where nothing is drawn. White keeps resampling from pulling
/// dark values into glyph edges.
const CLEAR: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Watermark position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
    Center,
}

impl WatermarkPosition {
    pub const ALL: [WatermarkPosition; 5] = [
        WatermarkPosition::BottomRight,
        WatermarkPosition::BottomLeft,
        WatermarkPosition::TopRight,
        WatermarkPosition::TopLeft,
        WatermarkPosition::Center,
    ];

    /// Parse a position name. Anything unrecognised means bottom-right.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "bottom-left" => WatermarkPosition::BottomLeft,
            "top-right" => WatermarkPosition::TopRight,
            "top-left" => WatermarkPosition::TopLeft,
            "center" | "centre" => WatermarkPosition::Center,
            _ => WatermarkPosition::BottomRight,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WatermarkPosition::BottomRight => "bottom-right",
            WatermarkPosition::BottomLeft => "bottom-left",
            WatermarkPosition::TopRight => "top-right",
            WatermarkPosition::TopLeft => "top-left",
            WatermarkPosition::Center => "center",
        }
    }
}

impl fmt::Display for WatermarkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkOptions {
    pub text: String,
    /// Alpha of the glyphs, the base image stays opaque.
    pub opacity: u8,
    /// Counter-clockwise rotation in degrees, 0..=90.
    pub angle: u16,
    pub position: WatermarkPosition,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: DEFAULT_WATERMARK_TEXT.to_string(),
            opacity: DEFAULT_WATERMARK_OPACITY,
            angle: 0,
            position: WatermarkPosition::default(),
        }
    }
}

impl WatermarkOptions {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_angle(mut self, angle: u16) -> Self {
        self.angle = angle.min(MAX_WATERMARK_ANGLE);
        self
    }

    pub fn with_position(mut self, position: WatermarkPosition) -> Self {
        self.position = position;
        self
    }
}

/// Where and how large the text is drawn. The box is the inked area of the
/// text, so `(x, y)` is the first inked pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub font_size: f32,
    pub text_width: u32,
    pub text_height: u32,
    pub x: i32,
    pub y: i32,
}

/// Font size for an image: a tenth of its shorter side, at least 1 px.
pub fn font_size_for(width: u32, height: u32) -> f32 {
    ((width.min(height) as f32 * 0.1) as u32).max(1) as f32
}

/// Top-left corner of a `text_width` x `text_height` box placed at `position`.
pub fn placement(
    position: WatermarkPosition,
    image_width: u32,
    image_height: u32,
    text_width: u32,
    text_height: u32,
) -> (i32, i32) {
    let (w, h) = (image_width as i32, image_height as i32);
    let (tw, th) = (text_width as i32, text_height as i32);

    match position {
        WatermarkPosition::BottomRight => (w - tw - WATERMARK_MARGIN, h - th - WATERMARK_MARGIN),
        WatermarkPosition::BottomLeft => (WATERMARK_MARGIN, h - th - WATERMARK_MARGIN),
        WatermarkPosition::TopRight => (w - tw - WATERMARK_MARGIN, WATERMARK_MARGIN),
        WatermarkPosition::TopLeft => (WATERMARK_MARGIN, WATERMARK_MARGIN),
        WatermarkPosition::Center => ((w - tw).div_euclid(2), (h - th).div_euclid(2)),
    }
}

pub struct Watermarker {
    font: WatermarkFont,
}

impl Watermarker {
    pub fn new(font: WatermarkFont) -> Self {
        Self { font }
    }

    /// Resolve the font from an optional configured path.
    pub fn with_font_path(path: Option<&Path>) -> Self {
        Self::new(WatermarkFont::load(path))
    }

    pub fn font(&self) -> &WatermarkFont {
        &self.font
    }

    fn laid_out(&self, width: u32, height: u32, options: &WatermarkOptions) -> (GrayImage, TextLayout) {
        let font_size = font_size_for(width, height);
        let mask = if options.text.is_empty() {
            GrayImage::new(0, 0)
        } else {
            self.font.render(font_size, &options.text)
        };
        let (x, y) = placement(options.position, width, height, mask.width(), mask.height());
        let layout = TextLayout {
            font_size,
            text_width: mask.width(),
            text_height: mask.height(),
            x,
            y,
        };
        (mask, layout)
    }

    /// Transparent layer the size of the image with the text drawn on it,
    /// before rotation. Glyphs are white; coverage scales their alpha.
    pub fn render_layer(&self, width: u32, height: u32, options: &WatermarkOptions) -> (RgbaImage, TextLayout) {
        let (mask, layout) = self.laid_out(width, height, options);
        let mut layer = RgbaImage::from_pixel(width, height, CLEAR);

        for (mx, my, coverage) in mask.enumerate_pixels() {
            let (px, py) = (layout.x + mx as i32, layout.y + my as i32);
            if coverage[0] == 0 || px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                continue;
            }
            let alpha = (u32::from(options.opacity) * u32::from(coverage[0]) + 127) / 255;
            layer.put_pixel(px as u32, py as u32, Rgba([255, 255, 255, alpha as u8]));
        }
        (layer, layout)
    }

    /// Watermark a copy of `image`. The result is opaque RGB with the input's
    /// dimensions.
    #[instrument(skip_all, fields(opacity = options.opacity, angle = options.angle, position = %options.position))]
    pub fn watermark(&self, image: &DynamicImage, options: &WatermarkOptions) -> DynamicImage {
        let (width, height) = (image.width(), image.height());

        // Fresh pixel buffer: nothing but pixel values is carried over.
        let mut base = image.to_rgba8();
        if width == 0 || height == 0 {
            return DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(base).to_rgb8());
        }

        let (mut layer, layout) = self.render_layer(width, height, options);
        debug!(
            font_size = layout.font_size,
            text_width = layout.text_width,
            text_height = layout.text_height,
            x = layout.x,
            y = layout.y,
            "Laid out watermark text"
        );

        let angle = options.angle.min(MAX_WATERMARK_ANGLE);
        if angle != 0 {
            let rotated = rotate_expanded(&layer, f32::from(angle));
            // Squeezing the expanded canvas back distorts the text aspect ratio.
            layer = imageops::resize(&rotated, width, height, FilterType::CatmullRom);
        }

        imageops::overlay(&mut base, &layer, 0, 0);
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(base).to_rgb8())
    }
}

/// Rotate counter-clockwise by `degrees`, growing the canvas so no corner is
/// clipped.
fn rotate_expanded(layer: &RgbaImage, degrees: f32) -> RgbaImage {
    let (w, h) = (layer.width() as f32, layer.height() as f32);
    let theta = degrees.to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());

    let new_w = (w * cos + h * sin).ceil().max(1.0) as u32;
    let new_h = (w * sin + h * cos).ceil().max(1.0) as u32;

    let projection = Projection::translate(new_w as f32 / 2.0, new_h as f32 / 2.0)
        * Projection::rotate(-theta)
        * Projection::translate(-w / 2.0, -h / 2.0);

    let mut out = RgbaImage::from_pixel(new_w, new_h, CLEAR);
    warp_into(
        layer,
        &projection,
        Interpolation::Bicubic,
        CLEAR,
        &mut out,
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_png;
    use crate::metadata::test_support::jpeg_with_exif;
    use crate::metadata::read_exif;
    use image::{ColorType, GenericImageView, Rgb, RgbImage};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([40, 40, 40])))
    }

    fn builtin() -> Watermarker {
        Watermarker::new(WatermarkFont::Builtin)
    }

    #[test]
    fn test_position_parse() {
        assert_eq!(WatermarkPosition::parse("Top-Left"), WatermarkPosition::TopLeft);
        assert_eq!(WatermarkPosition::parse("bottom_left"), WatermarkPosition::BottomLeft);
        assert_eq!(WatermarkPosition::parse("CENTER"), WatermarkPosition::Center);
        assert_eq!(WatermarkPosition::parse("middle"), WatermarkPosition::BottomRight);
        assert_eq!(WatermarkPosition::parse(""), WatermarkPosition::BottomRight);
        for position in WatermarkPosition::ALL {
            assert_eq!(WatermarkPosition::parse(position.as_str()), position);
        }
    }

    #[test]
    fn test_default_options() {
        let options = WatermarkOptions::default();
        assert_eq!(options.text, "SAFE SHARE");
        assert_eq!(options.opacity, 100);
        assert_eq!(options.angle, 0);
        assert_eq!(options.position, WatermarkPosition::BottomRight);
        assert_eq!(WatermarkOptions::new("X").with_angle(400).angle, 90);
    }

    #[test]
    fn test_font_size_for() {
        assert_eq!(font_size_for(400, 300), 30.0);
        assert_eq!(font_size_for(5, 5), 1.0);
    }

    #[test]
    fn test_placement_corners() {
        assert_eq!(placement(WatermarkPosition::TopLeft, 200, 100, 50, 20), (10, 10));
        assert_eq!(placement(WatermarkPosition::TopRight, 200, 100, 50, 20), (140, 10));
        assert_eq!(placement(WatermarkPosition::BottomLeft, 200, 100, 50, 20), (10, 70));
        assert_eq!(placement(WatermarkPosition::BottomRight, 200, 100, 50, 20), (140, 70));
    }

    #[test]
    fn test_placement_center() {
        assert_eq!(placement(WatermarkPosition::Center, 200, 100, 50, 20), (75, 40));
        assert_eq!(placement(WatermarkPosition::Center, 201, 101, 50, 20), (75, 40));
        // Wider than the image: floor division, like the layout rule
        assert_eq!(placement(WatermarkPosition::Center, 10, 10, 15, 10), (-3, 0));
    }

    /// Bounding box `(x0, y0, x1, y1)` of every pixel with non-zero alpha.
    fn ink_box(layer: &RgbaImage) -> Option<(i32, i32, i32, i32)> {
        layer
            .enumerate_pixels()
            .filter(|(_, _, p)| p[3] > 0)
            .fold(None, |bounds, (x, y, _)| {
                let (x, y) = (x as i32, y as i32);
                Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                })
            })
    }

    fn fonts() -> Vec<Watermarker> {
        // The loaded font is a system TrueType font whenever one is installed.
        vec![builtin(), Watermarker::with_font_path(None)]
    }

    #[test]
    fn test_rendered_center_text_is_centered() {
        for watermarker in fonts() {
            for (w, h) in [(400, 300), (320, 240), (401, 333), (120, 500)] {
                let options = WatermarkOptions::new("SAFE SHARE")
                    .with_opacity(255)
                    .with_position(WatermarkPosition::Center);
                let (layer, layout) = watermarker.render_layer(w, h, &options);
                let (x0, y0, x1, y1) = ink_box(&layer).unwrap();
                let (ink_w, ink_h) = (x1 - x0 + 1, y1 - y0 + 1);

                assert_eq!((ink_w as u32, ink_h as u32), (layout.text_width, layout.text_height));
                assert!((x0 - (w as i32 - ink_w) / 2).abs() <= 1, "{:?} x {x0}", watermarker.font());
                assert!((y0 - (h as i32 - ink_h) / 2).abs() <= 1, "{:?} y {y0}", watermarker.font());
            }
        }
    }

    #[test]
    fn test_rendered_corner_text_keeps_margin() {
        for watermarker in fonts() {
            let options = WatermarkOptions::new("SAFE SHARE").with_opacity(255);
            let (layer, _) = watermarker.render_layer(400, 300, &options);
            let (_, _, x1, y1) = ink_box(&layer).unwrap();
            assert_eq!(x1, 400 - WATERMARK_MARGIN - 1);
            assert_eq!(y1, 300 - WATERMARK_MARGIN - 1);
        }
    }

    #[test]
    fn test_white_text_never_darkens_base() {
        for watermarker in fonts() {
            for angle in [0, 30] {
                for opacity in [255, 100] {
                    let img = create_test_image(400, 300);
                    let options = WatermarkOptions::new("SAFE SHARE")
                        .with_opacity(opacity)
                        .with_angle(angle)
                        .with_position(WatermarkPosition::Center);
                    let result = watermarker.watermark(&img, &options).to_rgb8();

                    // One level of slack for blend rounding.
                    let darkest = result.pixels().flat_map(|p| p.0).min().unwrap();
                    assert!(darkest >= 39, "{:?} angle {angle}: {darkest}", watermarker.font());
                    assert!(result.pixels().any(|p| p.0[0] > 60));
                }
            }
        }
    }

    #[test]
    fn test_layer_rgb_is_white_everywhere() {
        for watermarker in fonts() {
            let (layer, _) = watermarker.render_layer(200, 120, &WatermarkOptions::default());
            assert!(layer.pixels().all(|p| p[0] == 255 && p[1] == 255 && p[2] == 255));
        }
    }

    #[test]
    fn test_watermark_preserves_dimensions() {
        let watermarker = builtin();
        for position in WatermarkPosition::ALL {
            for angle in [0, 30, 90] {
                let img = create_test_image(173, 91);
                let options = WatermarkOptions::default()
                    .with_angle(angle)
                    .with_position(position);
                let result = watermarker.watermark(&img, &options);
                assert_eq!(result.dimensions(), (173, 91));
                assert_eq!(result.color(), ColorType::Rgb8);
            }
        }
    }

    #[test]
    fn test_watermark_flattens_alpha() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            60,
            60,
            Rgba([10, 20, 30, 128]),
        ));
        let result = builtin().watermark(&img, &WatermarkOptions::default());
        assert_eq!(result.color(), ColorType::Rgb8);
    }

    #[test]
    fn test_watermark_draws_white_text() {
        let img = create_test_image(200, 200);
        let options = WatermarkOptions::new("MARK")
            .with_opacity(255)
            .with_position(WatermarkPosition::TopLeft);
        let result = builtin().watermark(&img, &options).to_rgb8();
        assert!(result.pixels().any(|p| *p == Rgb([255, 255, 255])));
        // Far corner untouched
        assert_eq!(*result.get_pixel(199, 199), Rgb([40, 40, 40]));
    }

    #[test]
    fn test_zero_opacity_leaves_pixels() {
        let img = create_test_image(120, 80);
        let options = WatermarkOptions::default().with_opacity(0);
        let result = builtin().watermark(&img, &options);
        assert_eq!(result.to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn test_watermark_does_not_carry_exif() {
        let data = jpeg_with_exif(64, 64);
        assert!(read_exif(&data).iter().any(|f| f.tag == "Make"));

        let img = crate::codec::decode(&data, usize::MAX).unwrap();
        let encoded = encode_png(&builtin().watermark(&img, &WatermarkOptions::default())).unwrap();
        assert!(read_exif(&encoded).is_empty());
    }
}
