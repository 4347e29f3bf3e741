/// Upload-time image resizing
///
/// Every upload is re-encoded as a JPEG sized for the place it will be shown
/// (hero banner, product card, category tile, gallery cell) before it reaches
/// storage. The source is always drawn centered on a white canvas.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, Rgba, RgbaImage};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use thiserror::Error;

use crate::error::ResizeError;

/// JPEG quality used by every preset (0.0 - 1.0)
const DEFAULT_QUALITY: f32 = 0.85;

/// Canvas fill behind the drawn image
const FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Where an uploaded image is going to be displayed
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImageContext {
    Hero,
    Product,
    Category,
    Gallery,
}

/// Target canvas for a context
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    /// JPEG quality (0.0 - 1.0)
    pub quality: f32,
}

/// Per-call replacements for preset values
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DimensionOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<f32>,
}

impl ImageContext {
    pub const ALL: [ImageContext; 4] = [
        ImageContext::Hero,
        ImageContext::Product,
        ImageContext::Category,
        ImageContext::Gallery,
    ];

    /// Fixed target size for this context
    pub const fn preset(self) -> Dimensions {
        let (width, height) = match self {
            ImageContext::Hero => (1920, 1080),
            ImageContext::Product => (800, 800),
            ImageContext::Category => (600, 600),
            ImageContext::Gallery => (400, 600),
        };
        Dimensions {
            width,
            height,
            quality: DEFAULT_QUALITY,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageContext::Hero => "hero",
            ImageContext::Product => "product",
            ImageContext::Category => "category",
            ImageContext::Gallery => "gallery",
        }
    }
}

impl fmt::Display for ImageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown image context: {0}")]
pub struct UnknownContext(pub String);

impl FromStr for ImageContext {
    type Err = UnknownContext;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageContext::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownContext(s.to_string()))
    }
}

impl Dimensions {
    fn with_overrides(self, overrides: DimensionOverrides) -> Self {
        Self {
            width: overrides.width.unwrap_or(self.width),
            height: overrides.height.unwrap_or(self.height),
            quality: overrides.quality.unwrap_or(self.quality),
        }
    }

    /// Quality mapped onto the encoder's 1-100 scale
    fn jpeg_quality(&self) -> u8 {
        let q = if self.quality.is_finite() { self.quality } else { DEFAULT_QUALITY };
        (q.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8
    }
}

/// A re-encoded upload, ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct ResizedImage {
    /// Original file name, kept so storage can derive the object name
    pub file_name: String,
    /// JPEG bytes
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ResizedImage {
    pub const CONTENT_TYPE: &'static str = "image/jpeg";

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Intrinsic dimensions and byte size of an image file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub size: u64,
}

/// How the source is placed on the output canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub draw_width: u32,
    pub draw_height: u32,
    pub offset_x: i64,
    pub offset_y: i64,
}

/// Compute the canvas and draw rectangle for a source of the given size
///
/// - product/category: the canvas is exactly the target; the source is scaled
///   to fit inside it and letterboxed
/// - hero: the canvas takes the source's aspect ratio, fitted inside the target
/// - gallery: the source is scaled to cover the target and the canvas is
///   bounded by the target on both axes
pub fn compute_layout(
    context: ImageContext,
    source_width: u32,
    source_height: u32,
    target: Dimensions,
) -> Layout {
    let (sw, sh) = (source_width.max(1) as f64, source_height.max(1) as f64);
    let (tw, th) = (target.width as f64, target.height as f64);
    let aspect = sw / sh;
    let target_aspect = tw / th;

    let fit = if aspect > target_aspect {
        (tw, tw / aspect)
    } else {
        (th * aspect, th)
    };

    let (draw, canvas) = match context {
        ImageContext::Product | ImageContext::Category => (fit, (tw, th)),
        ImageContext::Hero => (fit, fit),
        ImageContext::Gallery => {
            let cover = if aspect > target_aspect {
                (th * aspect, th)
            } else {
                (tw, tw / aspect)
            };
            (cover, (cover.0.min(tw), cover.1.min(th)))
        }
    };

    let px = |v: f64| v.round().max(1.0) as u32;
    let (draw_width, draw_height) = (px(draw.0), px(draw.1));
    let (canvas_width, canvas_height) = (px(canvas.0), px(canvas.1));

    Layout {
        canvas_width,
        canvas_height,
        draw_width,
        draw_height,
        offset_x: (canvas_width as i64 - draw_width as i64) / 2,
        offset_y: (canvas_height as i64 - draw_height as i64) / 2,
    }
}

/// The part of the source that actually lands on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRegion {
    /// Source rectangle to crop
    pub source_x: u32,
    pub source_y: u32,
    pub source_width: u32,
    pub source_height: u32,
    /// Size the crop is scaled to
    pub width: u32,
    pub height: u32,
    /// Where the scaled crop goes on the canvas
    pub canvas_x: i64,
    pub canvas_y: i64,
}

impl Layout {
    /// Clip the draw rectangle to the canvas and map it back onto the source
    pub fn visible_region(&self, source_width: u32, source_height: u32) -> VisibleRegion {
        let (source_x, source_width, width, canvas_x) = visible_span(
            self.offset_x,
            self.draw_width,
            self.canvas_width,
            source_width.max(1),
        );
        let (source_y, source_height, height, canvas_y) = visible_span(
            self.offset_y,
            self.draw_height,
            self.canvas_height,
            source_height.max(1),
        );

        VisibleRegion {
            source_x,
            source_y,
            source_width,
            source_height,
            width,
            height,
            canvas_x,
            canvas_y,
        }
    }
}

/// One axis of `visible_region`: (source start, source len, drawn len, canvas start)
fn visible_span(offset: i64, draw: u32, canvas: u32, source: u32) -> (u32, u32, u32, i64) {
    let start = (-offset).max(0) as u32;
    let end = (canvas as i64 - offset).min(draw as i64).max(start as i64 + 1) as u32;
    let scale = source as f64 / draw as f64;

    let src_start = ((start as f64 * scale).floor() as u32).min(source - 1);
    let src_end = ((end as f64 * scale).ceil() as u32).clamp(src_start + 1, source);

    (src_start, src_end - src_start, end - start, offset.max(0))
}

/// Resize an uploaded image for a display context
///
/// # Arguments
/// * `bytes` - Encoded source image (any format the `image` crate can decode)
/// * `file_name` - Original file name, carried through to the result
/// * `context` - Which preset to use
/// * `overrides` - Optional replacements for the preset's width/height/quality
///
/// # Returns
/// * `Ok(ResizedImage)` - JPEG bytes with the canvas dimensions
/// * `Err(ResizeError)` - The source could not be decoded or the result could not be encoded
pub fn resize_image(
    bytes: &[u8],
    file_name: &str,
    context: ImageContext,
    overrides: DimensionOverrides,
) -> Result<ResizedImage, ResizeError> {
    let target = context.preset().with_overrides(overrides);
    if target.width == 0 || target.height == 0 {
        return Err(ResizeError::EmptyCanvas {
            width: target.width,
            height: target.height,
        });
    }

    let source = image::load_from_memory(bytes).map_err(ResizeError::Decode)?;
    let layout = compute_layout(context, source.width(), source.height(), target);

    debug!(
        "resizing {} ({}x{}) for {}: canvas {}x{}, draw {}x{}",
        file_name,
        source.width(),
        source.height(),
        context,
        layout.canvas_width,
        layout.canvas_height,
        layout.draw_width,
        layout.draw_height
    );

    // Only the part of the source that lands on the canvas is scaled
    let region = layout.visible_region(source.width(), source.height());
    let scaled = source
        .crop_imm(
            region.source_x,
            region.source_y,
            region.source_width,
            region.source_height,
        )
        .resize_exact(region.width, region.height, FilterType::Lanczos3)
        .to_rgba8();

    let mut canvas = RgbaImage::from_pixel(layout.canvas_width, layout.canvas_height, FILL);
    imageops::overlay(&mut canvas, &scaled, region.canvas_x, region.canvas_y);
    let flattened = DynamicImage::ImageRgba8(canvas).to_rgb8();

    let mut encoded = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut encoded, target.jpeg_quality());
        encoder
            .encode_image(&flattened)
            .map_err(ResizeError::Encode)?;
    }

    if encoded.is_empty() {
        return Err(ResizeError::EmptyOutput);
    }

    info!(
        "resized {} for {}: {} -> {} ({}x{})",
        file_name,
        context,
        format_file_size(bytes.len() as u64),
        format_file_size(encoded.len() as u64),
        layout.canvas_width,
        layout.canvas_height
    );

    Ok(ResizedImage {
        file_name: file_name.to_string(),
        bytes: encoded,
        width: layout.canvas_width,
        height: layout.canvas_height,
    })
}

/// Resize on the blocking pool so callers on the async runtime are not stalled
pub async fn resize_image_async(
    bytes: Vec<u8>,
    file_name: String,
    context: ImageContext,
    overrides: DimensionOverrides,
) -> Result<ResizedImage, ResizeError> {
    tokio::task::spawn_blocking(move || resize_image(&bytes, &file_name, context, overrides))
        .await
        .map_err(|e| ResizeError::Task(e.to_string()))?
}

/// Read the pixel dimensions from the image header without decoding pixels
pub fn image_info(bytes: &[u8]) -> Result<ImageInfo, ResizeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ResizeError::Header)?;
    let (width, height) = reader.into_dimensions().map_err(ResizeError::Decode)?;

    Ok(ImageInfo {
        width,
        height,
        size: bytes.len() as u64,
    })
}

/// Human-readable byte size: "0 Bytes", "1 KB", "1.5 KB", "2.31 MB"
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor = 1u64;
    while unit < UNITS.len() - 1 && bytes >= divisor * 1024 {
        divisor *= 1024;
        unit += 1;
    }

    let value = (bytes as f64 / divisor as f64 * 100.0).round() / 100.0;
    format!("{} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 20, 20]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn decoded_size(resized: &ResizedImage) -> (u32, u32) {
        let img = image::load_from_memory(&resized.bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_presets_are_fixed() {
        assert_eq!((ImageContext::Hero.preset().width, ImageContext::Hero.preset().height), (1920, 1080));
        assert_eq!((ImageContext::Product.preset().width, ImageContext::Product.preset().height), (800, 800));
        assert_eq!((ImageContext::Category.preset().width, ImageContext::Category.preset().height), (600, 600));
        assert_eq!((ImageContext::Gallery.preset().width, ImageContext::Gallery.preset().height), (400, 600));
        for context in ImageContext::ALL {
            assert_eq!(context.preset().quality, 0.85);
            assert_eq!(context.preset().jpeg_quality(), 85);
        }
    }

    #[test]
    fn test_product_and_category_are_always_preset_size() {
        for (w, h) in [(1600, 400), (300, 900), (10, 10), (800, 800)] {
            let source = png(w, h);
            let product = resize_image(&source, "p.png", ImageContext::Product, DimensionOverrides::default()).unwrap();
            assert_eq!((product.width, product.height), (800, 800));
            assert_eq!(decoded_size(&product), (800, 800));

            let category = resize_image(&source, "c.png", ImageContext::Category, DimensionOverrides::default()).unwrap();
            assert_eq!(decoded_size(&category), (600, 600));
        }
    }

    #[test]
    fn test_product_letterbox_is_white() {
        let source = png(1600, 400);
        let out = resize_image(&source, "wide.png", ImageContext::Product, DimensionOverrides::default()).unwrap();
        let img = image::load_from_memory(&out.bytes).unwrap().to_rgb8();

        // Source fits as 800x200 in the middle; top and bottom bands are fill
        let corner = img.get_pixel(5, 5);
        assert!(corner.0.iter().all(|&c| c > 235), "corner was {:?}", corner);
        let center = img.get_pixel(400, 400);
        assert!(center.0[0] > 150 && center.0[1] < 80, "center was {:?}", center);
    }

    #[test]
    fn test_hero_layout_keeps_source_aspect() {
        let target = ImageContext::Hero.preset();

        let wide = compute_layout(ImageContext::Hero, 3840, 1080, target);
        assert_eq!((wide.canvas_width, wide.canvas_height), (1920, 540));
        assert_eq!((wide.offset_x, wide.offset_y), (0, 0));

        let tall = compute_layout(ImageContext::Hero, 1000, 2000, target);
        assert_eq!((tall.canvas_width, tall.canvas_height), (540, 1080));
    }

    #[test]
    fn test_gallery_layout_is_bounded_by_preset() {
        let target = ImageContext::Gallery.preset();

        let landscape = compute_layout(ImageContext::Gallery, 800, 600, target);
        assert_eq!((landscape.canvas_width, landscape.canvas_height), (400, 600));
        assert_eq!((landscape.draw_width, landscape.draw_height), (800, 600));
        assert_eq!(landscape.offset_x, -200);

        let portrait = compute_layout(ImageContext::Gallery, 200, 600, target);
        assert!(portrait.canvas_width <= 400 && portrait.canvas_height <= 600);
    }

    #[test]
    fn test_visible_region_clips_cover_overflow() {
        let target = ImageContext::Gallery.preset();

        let landscape = compute_layout(ImageContext::Gallery, 800, 600, target);
        let region = landscape.visible_region(800, 600);
        assert_eq!((region.source_x, region.source_width), (200, 400));
        assert_eq!((region.width, region.height), (400, 600));
        assert_eq!((region.canvas_x, region.canvas_y), (0, 0));

        // Letterboxed layouts keep the whole source
        let product = compute_layout(ImageContext::Product, 1600, 400, ImageContext::Product.preset());
        let region = product.visible_region(1600, 400);
        assert_eq!((region.source_width, region.source_height), (1600, 400));
        assert_eq!((region.width, region.height), (800, 200));
        assert_eq!(region.canvas_y, 300);
    }

    #[test]
    fn test_extreme_aspect_gallery_stays_canvas_sized() {
        let layout = compute_layout(ImageContext::Gallery, 4000, 4, ImageContext::Gallery.preset());
        let region = layout.visible_region(4000, 4);
        assert!(region.width as u64 * region.height as u64 <= 400 * 600);
        assert!(region.source_width <= 4);

        let out = resize_image(&png(4000, 4), "strip.png", ImageContext::Gallery, DimensionOverrides::default()).unwrap();
        assert_eq!(decoded_size(&out), (400, 600));
    }

    #[test]
    fn test_hero_resize_with_overrides() {
        let source = png(384, 54);
        let overrides = DimensionOverrides {
            width: Some(192),
            height: Some(108),
            quality: None,
        };
        let out = resize_image(&source, "banner.png", ImageContext::Hero, overrides).unwrap();
        assert_eq!(decoded_size(&out), (192, 27));
        assert_eq!(out.file_name, "banner.png");
    }

    #[test]
    fn test_overrides_replace_square_preset() {
        let source = png(50, 50);
        let overrides = DimensionOverrides {
            width: Some(100),
            height: Some(50),
            quality: Some(0.5),
        };
        let out = resize_image(&source, "x.png", ImageContext::Product, overrides).unwrap();
        assert_eq!(decoded_size(&out), (100, 50));
    }

    #[test]
    fn test_zero_target_is_rejected() {
        let overrides = DimensionOverrides {
            width: Some(0),
            ..Default::default()
        };
        let err = resize_image(&png(10, 10), "x.png", ImageContext::Product, overrides).unwrap_err();
        assert!(matches!(err, ResizeError::EmptyCanvas { .. }));
    }

    #[test]
    fn test_undecodable_source_fails() {
        let err = resize_image(b"not an image", "x.png", ImageContext::Gallery, DimensionOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ResizeError::Decode(_)));
    }

    #[tokio::test]
    async fn test_resize_async() {
        let out = resize_image_async(png(120, 80), "a.png".into(), ImageContext::Category, DimensionOverrides::default())
            .await
            .unwrap();
        assert_eq!((out.width, out.height), (600, 600));
    }

    #[test]
    fn test_image_info() {
        let bytes = png(640, 480);
        let info = image_info(&bytes).unwrap();
        assert_eq!((info.width, info.height), (640, 480));
        assert_eq!(info.size, bytes.len() as u64);

        assert!(image_info(b"garbage").is_err());
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024), "1 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5 GB");
    }

    #[test]
    fn test_context_parsing() {
        assert_eq!("Hero".parse::<ImageContext>().unwrap(), ImageContext::Hero);
        assert_eq!(" gallery ".parse::<ImageContext>().unwrap(), ImageContext::Gallery);
        assert!("banner".parse::<ImageContext>().is_err());
    }
}
