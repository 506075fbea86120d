use ab_glyph::{FontVec, PxScale};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::Path;
use thiserror::Error;

const GLYPH_SIZE: u32 = 8;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to read font file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Invalid font data: {0}")]
    Invalid(#[from] ab_glyph::InvalidFont),
}

/// Font used for box labels.
///
/// `Bitmap` is the built-in 8x8 ASCII font, scaled by whole pixels, used when
/// no TrueType font can be loaded.
pub enum LabelFont {
    TrueType { font: FontVec, scale: PxScale },
    Bitmap { scale: u32 },
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelFont::TrueType { scale, .. } => f
                .debug_struct("TrueType")
                .field("scale", &scale.y)
                .finish(),
            LabelFont::Bitmap { scale } => f.debug_struct("Bitmap").field("scale", scale).finish(),
        }
    }
}

impl LabelFont {
    /// Loads the font at `path`, falling back to the built-in bitmap font.
    pub fn load_or_default(path: &Path, size: f32) -> Self {
        match Self::load(path, size) {
            Ok(font) => font,
            Err(e) => {
                tracing::warn!(
                    "Failed to load font {:?}: {}. Using the built-in bitmap font",
                    path,
                    e
                );
                Self::bitmap(size)
            }
        }
    }

    pub fn load(path: &Path, size: f32) -> Result<Self, FontError> {
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(data)?;
        Ok(LabelFont::TrueType {
            font,
            scale: PxScale::from(size),
        })
    }

    pub fn bitmap(size: f32) -> Self {
        let scale = (size / GLYPH_SIZE as f32).round().max(1.0) as u32;
        LabelFont::Bitmap { scale }
    }

    /// Width and height of `text` when drawn.
    pub fn text_size(&self, text: &str) -> (u32, u32) {
        match self {
            LabelFont::TrueType { font, scale } => text_size(*scale, font, text),
            LabelFont::Bitmap { scale } => {
                let cell = GLYPH_SIZE * scale;
                (text.chars().count() as u32 * cell, cell)
            }
        }
    }

    /// Draws `text` with its top-left corner at `(x, y)`; pixels outside the
    /// image are clipped.
    pub fn draw_text(&self, image: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, text: &str) {
        match self {
            LabelFont::TrueType { font, scale } => {
                draw_text_mut(image, color, x, y, *scale, font, text)
            }
            LabelFont::Bitmap { scale } => draw_bitmap_text(image, color, x, y, *scale, text),
        }
    }
}

fn draw_bitmap_text(image: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, scale: u32, text: &str) {
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));
    let cell = i64::from(GLYPH_SIZE * scale);
    let scale = i64::from(scale);

    for (position, c) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(c)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        let origin_x = i64::from(x) + position as i64 * cell;

        for (row, bits) in glyph.iter().enumerate() {
            let origin_y = i64::from(y) + row as i64 * scale;
            // Bit 0 is the leftmost column.
            for column in 0..GLYPH_SIZE {
                if (bits >> column) & 1 == 0 {
                    continue;
                }
                let origin_x = origin_x + i64::from(column) * scale;
                for py in origin_y..origin_y + scale {
                    for px in origin_x..origin_x + scale {
                        if (0..width).contains(&px) && (0..height).contains(&py) {
                            image.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
    }
}
