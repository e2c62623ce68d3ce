//! Speech bubbles and caption boxes.

use image::RgbImage;
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_polygon_mut,
    draw_text_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;

use super::{BLACK, Fonts, WHITE};

/// Inner padding of bubbles and captions.
pub const PADDING: u32 = 10;
/// Extra space between wrapped lines.
pub const LINE_GAP: u32 = 5;
/// Leaves room for the tail on very short lines.
pub const MIN_BUBBLE_WIDTH: u32 = 60;
/// How far the bubble tail hangs below the box.
pub const TAIL_HEIGHT: u32 = 20;

/// Wrapped text and the box it needs.
#[derive(Clone, Debug)]
pub struct TextBox {
    lines: Vec<String>,
    line_height: u32,
    /// Box width including padding
    pub width: u32,
    /// Box height including padding
    pub height: u32,
}

impl TextBox {
    fn layout(fonts: &Fonts, text: &str, max_text_width: u32, fixed_width: Option<u32>) -> Option<Self> {
        let lines = fonts.wrap_text(fonts.body, text, max_text_width);
        if lines.is_empty() {
            return None;
        }
        let line_height = fonts.line_height(fonts.body);
        let widest = lines
            .iter()
            .map(|line| fonts.text_width(fonts.body, line))
            .max()
            .unwrap_or(0);
        let count = lines.len() as u32;
        Some(Self {
            width: fixed_width.unwrap_or(widest + PADDING * 2),
            height: count * line_height + (count - 1) * LINE_GAP + PADDING * 2,
            lines,
            line_height,
        })
    }

    /// Lays out a bubble no wider than `max_width`.
    pub fn bubble(fonts: &Fonts, text: &str, max_width: u32) -> Option<Self> {
        Self::layout(fonts, text, max_width.saturating_sub(PADDING * 2), None).map(|mut bubble| {
            bubble.width = bubble.width.max(MIN_BUBBLE_WIDTH);
            bubble
        })
    }

    /// Lays out a caption spanning exactly `width`.
    pub fn caption(fonts: &Fonts, text: &str, width: u32) -> Option<Self> {
        Self::layout(fonts, text, width.saturating_sub(PADDING * 2), Some(width))
    }

    /// Vertical space the bubble takes, tail included.
    pub fn bubble_extent(&self) -> u32 {
        self.height + TAIL_HEIGHT
    }

    fn draw_lines(&self, canvas: &mut RgbImage, fonts: &Fonts, x: i32, y: i32) {
        let mut line_y = y + PADDING as i32;
        for line in &self.lines {
            draw_text_mut(
                canvas,
                BLACK,
                x + PADDING as i32,
                line_y,
                fonts.body,
                &fonts.font,
                line,
            );
            line_y += (self.line_height + LINE_GAP) as i32;
        }
    }
}

fn draw_box(canvas: &mut RgbImage, x: i32, y: i32, width: u32, height: u32) {
    let rect = Rect::at(x, y).of_size(width.max(1), height.max(1));
    draw_filled_rect_mut(canvas, rect, WHITE);
    draw_hollow_rect_mut(canvas, rect, BLACK);
}

/// Draws a bubble with its top-left corner at `(x, y)` and a tail below it.
pub fn draw_speech_bubble(canvas: &mut RgbImage, fonts: &Fonts, bubble: &TextBox, x: i32, y: i32) {
    draw_box(canvas, x, y, bubble.width, bubble.height);

    let base_y = y + bubble.height as i32 - 1;
    let tip = (x as f32 + 20.0, (base_y + TAIL_HEIGHT as i32) as f32);
    let left = (x as f32 + 30.0, base_y as f32);
    let right = (x as f32 + 50.0, base_y as f32);
    draw_polygon_mut(
        canvas,
        &[
            Point::new(left.0 as i32, left.1 as i32),
            Point::new(tip.0 as i32, tip.1 as i32),
            Point::new(right.0 as i32, right.1 as i32),
        ],
        WHITE,
    );
    draw_line_segment_mut(canvas, left, tip, BLACK);
    draw_line_segment_mut(canvas, tip, right, BLACK);

    bubble.draw_lines(canvas, fonts, x, y);
}

/// Draws a caption box whose bottom edge sits on `bottom`.
pub fn draw_caption(canvas: &mut RgbImage, fonts: &Fonts, caption: &TextBox, x: i32, bottom: i32) {
    let top = bottom - caption.height as i32;
    draw_box(canvas, x, top, caption.width, caption.height);
    caption.draw_lines(canvas, fonts, x, top);
}
