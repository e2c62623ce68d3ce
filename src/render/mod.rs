//! Raster composition: fonts, text wrapping, the placeholder panel.
//!
//! Drawing primitives come from `imageproc`, glyph metrics from `ab_glyph`.

use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::constants::{BODY_FONT_SIZE, PANEL_HEIGHT, PANEL_WIDTH, TITLE_FONT_SIZE};
use crate::error::ComicError;

pub mod bubble;
pub mod strip;

const FONT_DATA: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/fonts/DejaVuSans.ttf"
));

pub(crate) const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub(crate) const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub(crate) const LIGHT_GRAY: Rgb<u8> = Rgb([211, 211, 211]);

/// The bundled font at the two sizes the strip uses.
#[derive(Clone, Debug)]
pub struct Fonts {
    pub(crate) font: FontRef<'static>,
    pub(crate) title: PxScale,
    pub(crate) body: PxScale,
}

impl Fonts {
    /// Parses the bundled font.
    pub fn load() -> Result<Self, ComicError> {
        let font = FontRef::try_from_slice(FONT_DATA)
            .map_err(|err| ComicError::InternalServerError(format!("Invalid font: {err}")))?;
        Ok(Self {
            font,
            title: PxScale::from(TITLE_FONT_SIZE),
            body: PxScale::from(BODY_FONT_SIZE),
        })
    }

    /// Rendered width of a single line in pixels.
    pub fn text_width(&self, scale: PxScale, text: &str) -> u32 {
        text_size(scale, &self.font, text).0
    }

    /// Distance between two baselines, without extra spacing.
    pub fn line_height(&self, scale: PxScale) -> u32 {
        self.font.as_scaled(scale).height().ceil() as u32
    }

    /// Greedy word wrap. A word wider than `max_width` gets a line of its own.
    pub fn wrap_text(&self, scale: PxScale, text: &str, max_width: u32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        for word in text.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if self.text_width(scale, &candidate) <= max_width || current.is_empty() {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    /// First wrapped line of `text`, with an ellipsis when the rest was cut.
    pub fn fit_line(&self, scale: PxScale, text: &str, max_width: u32) -> String {
        let mut lines = self.wrap_text(scale, text, max_width).into_iter();
        let Some(first) = lines.next() else {
            return String::new();
        };
        if lines.next().is_none() && self.text_width(scale, &first) <= max_width {
            return first;
        }
        let mut words: Vec<&str> = first.split_whitespace().collect();
        while !words.is_empty() {
            let candidate = format!("{}…", words.join(" "));
            if self.text_width(scale, &candidate) <= max_width || words.len() == 1 {
                return candidate;
            }
            words.pop();
        }
        String::new()
    }
}

/// The stock panel used whenever image generation fails.
pub fn placeholder_image() -> Result<RgbImage, ComicError> {
    let fonts = Fonts::load()?;
    let mut image = RgbImage::from_pixel(PANEL_WIDTH, PANEL_HEIGHT, LIGHT_GRAY);
    let label = "No Image";
    let (width, height) = text_size(fonts.title, &fonts.font, label);
    let x = (PANEL_WIDTH.saturating_sub(width) / 2) as i32;
    let y = (PANEL_HEIGHT.saturating_sub(height) / 2) as i32;
    draw_text_mut(&mut image, BLACK, x, y, fonts.title, &fonts.font, label);
    Ok(image)
}
