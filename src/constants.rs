//! Shared constants for things
//!

use std::sync::LazyLock;

/// Default number of panels in a strip
pub const DEFAULT_PANEL_COUNT: u8 = 4;

/// Upper bound for the configurable panel count
pub const MAX_PANEL_COUNT: u8 = 12;

/// Width every panel is resized to before it is composited.
pub const PANEL_WIDTH: u32 = 400;

/// Height every panel is resized to before it is composited.
pub const PANEL_HEIGHT: u32 = 600;

/// Height of the title band above the panel grid.
pub const TITLE_HEIGHT: u32 = 80;

/// Panels per row in the stitched strip.
pub const STRIP_COLUMNS: u32 = 2;

/// Title font size in pixels
pub const TITLE_FONT_SIZE: f32 = 36.0;

/// Bubble and caption font size in pixels
pub const BODY_FONT_SIZE: f32 = 20.0;

/// File name of the fallback panel image inside the media root.
pub const PLACEHOLDER_FILENAME: &str = "placeholder.png";

/// Sub directory of the media root holding generated panels and strips.
pub const GENERATED_IMAGES_DIR: &str = "generated_images";

/// Used when the script has fewer panels than requested.
pub const FALLBACK_SCENE_DESCRIPTION: &str =
    "A generic educational comic panel for Ghanaian children.";

/// Appended to every scene description sent to the image API.
pub const PANEL_STYLE_DESCRIPTION: &str = "Educational comic book style for young children.";

/// Default text model
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";

/// Default text generation API base URL
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default image generation API base URL
pub const DEFAULT_STABILITY_BASE_URL: &str = "https://api.stability.ai";

/// Seconds to wait on a single image generation call.
pub const IMAGE_REQUEST_TIMEOUT_SECONDS: u64 = 60;

/// Seconds to wait on a script generation call.
pub const SCRIPT_REQUEST_TIMEOUT_SECONDS: u64 = 120;

/// Generated strips are never rewritten, so they can be cached for a long time.
pub const STRIP_CACHE_MAX_AGE_SECONDS: u64 = 60 * 60 * 24 * 30;

/// Cache-Control value for strip responses.
pub static STRIP_CACHE_CONTROL: LazyLock<String> =
    LazyLock::new(|| format!("public, max-age={}, immutable", STRIP_CACHE_MAX_AGE_SECONDS));

/// Number of recent comics shown on the home page
pub const RECENT_COMICS_LIMIT: u64 = 8;
