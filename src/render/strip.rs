//! Stitches annotated panels into one strip.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::debug;

use super::bubble::{TextBox, draw_caption, draw_speech_bubble};
use super::{BLACK, Fonts, WHITE};
use crate::constants::{PANEL_HEIGHT, PANEL_WIDTH, STRIP_COLUMNS, TITLE_HEIGHT};
use crate::script::PanelScript;

/// Distance from the panel's top-left corner to the first bubble.
const BUBBLE_INSET_X: u32 = 20;
const BUBBLE_INSET_Y: u32 = 40;
/// Vertical gap between stacked bubbles.
const BUBBLE_GAP: u32 = 6;

/// A panel image plus the text drawn on top of it.
#[derive(Clone, Debug)]
pub struct PanelArt {
    /// Panel artwork, any size; resized on assembly.
    pub image: DynamicImage,
    /// Dialogue and narration for the panel.
    pub script: PanelScript,
}

/// Grid shape for `count` panels: (columns, rows).
pub fn grid(count: usize) -> (u32, u32) {
    let count = count.max(1) as u32;
    let columns = count.min(STRIP_COLUMNS);
    (columns, count.div_ceil(columns))
}

/// Draws one panel's text onto the strip at the panel origin.
fn annotate(canvas: &mut RgbImage, fonts: &Fonts, script: &PanelScript, x: u32, y: u32) {
    let panel_bottom = y + PANEL_HEIGHT;

    let caption = TextBox::caption(fonts, &script.narration, PANEL_WIDTH);
    let text_floor = caption
        .as_ref()
        .map(|caption| panel_bottom.saturating_sub(caption.height))
        .unwrap_or(panel_bottom);

    let mut bubble_y = y + BUBBLE_INSET_Y;
    for (idx, line) in script.dialogue.iter().enumerate() {
        let Some(bubble) =
            TextBox::bubble(fonts, line, PANEL_WIDTH - BUBBLE_INSET_X * 3)
        else {
            continue;
        };
        // The first bubble is always drawn, later ones only while they fit.
        if idx > 0 && bubble_y + bubble.bubble_extent() > text_floor {
            debug!(
                "Dropping {} dialogue line(s) that do not fit the panel",
                script.dialogue.len() - idx
            );
            break;
        }
        draw_speech_bubble(
            canvas,
            fonts,
            &bubble,
            (x + BUBBLE_INSET_X) as i32,
            bubble_y as i32,
        );
        bubble_y += bubble.bubble_extent() + BUBBLE_GAP;
    }

    if let Some(caption) = caption {
        draw_caption(canvas, fonts, &caption, x as i32, panel_bottom as i32);
    }
}

/// Lays the panels out in a two-column grid under a title band.
pub fn assemble(fonts: &Fonts, panels: &[PanelArt], title: &str) -> RgbImage {
    let (columns, rows) = grid(panels.len());
    let width = columns * PANEL_WIDTH;
    let height = TITLE_HEIGHT + rows * PANEL_HEIGHT;
    let mut canvas = RgbImage::from_pixel(width, height, WHITE);

    let title = fonts.fit_line(fonts.title, title, width.saturating_sub(20));
    let title_width = fonts.text_width(fonts.title, &title);
    let title_height = fonts.line_height(fonts.title);
    draw_text_mut(
        &mut canvas,
        BLACK,
        (width.saturating_sub(title_width) / 2) as i32,
        (TITLE_HEIGHT.saturating_sub(title_height) / 2) as i32,
        fonts.title,
        &fonts.font,
        &title,
    );

    for (idx, panel) in panels.iter().enumerate() {
        let idx = idx as u32;
        let x = (idx % columns) * PANEL_WIDTH;
        let y = TITLE_HEIGHT + (idx / columns) * PANEL_HEIGHT;

        let resized = panel
            .image
            .resize_exact(PANEL_WIDTH, PANEL_HEIGHT, FilterType::Triangle)
            .to_rgb8();
        imageops::replace(&mut canvas, &resized, i64::from(x), i64::from(y));

        annotate(&mut canvas, fonts, &panel.script, x, y);
        draw_hollow_rect_mut(
            &mut canvas,
            Rect::at(x as i32, y as i32).of_size(PANEL_WIDTH, PANEL_HEIGHT),
            BLACK,
        );
    }

    canvas
}
