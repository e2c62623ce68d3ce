//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_PANEL_COUNT, DEFAULT_STABILITY_BASE_URL, DEFAULT_TEXT_MODEL,
    MAX_PANEL_COUNT,
};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "COMICKIDS_DEBUG")]
    /// Enable debug logging. Env: COMICKIDS_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "COMICKIDS_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: COMICKIDS_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "COMICKIDS_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: COMICKIDS_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(
        long,
        default_value = "comickids.sqlite",
        env = "COMICKIDS_DATABASE_PATH"
    )]
    /// Path to the database file, eg `/data/comickids.sqlite`.
    /// Env: COMICKIDS_DATABASE_PATH
    pub database_path: String,

    #[clap(long, default_value = "./media", env = "COMICKIDS_MEDIA_DIR")]
    /// Where the placeholder and generated images live.
    /// Env: COMICKIDS_MEDIA_DIR
    pub media_dir: PathBuf,

    #[clap(long, default_value = "/media/", env = "COMICKIDS_MEDIA_URL")]
    /// URL prefix the media directory is served under.
    /// Env: COMICKIDS_MEDIA_URL
    pub media_url: String,

    #[clap(
        long,
        default_value_t = DEFAULT_PANEL_COUNT,
        value_parser = clap::value_parser!(u8).range(1..=MAX_PANEL_COUNT as i64),
        env = "COMICKIDS_PANEL_COUNT"
    )]
    /// Number of panels per strip.
    /// Env: COMICKIDS_PANEL_COUNT
    pub panel_count: u8,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    /// Text generation API key. Script generation fails without it.
    pub gemini_api_key: Option<String>,

    #[arg(long, default_value = DEFAULT_TEXT_MODEL, env = "COMICKIDS_TEXT_MODEL")]
    /// Text model used for script generation
    pub text_model: String,

    #[arg(long, default_value = DEFAULT_GEMINI_BASE_URL, env = "COMICKIDS_GEMINI_BASE_URL")]
    /// Base URL of the text generation API
    pub gemini_base_url: String,

    #[arg(long, env = "STABILITY_API_KEY", hide_env_values = true)]
    /// Image generation API key. Panels use the placeholder without it.
    pub stability_api_key: Option<String>,

    #[arg(
        long,
        default_value = DEFAULT_STABILITY_BASE_URL,
        env = "COMICKIDS_STABILITY_BASE_URL"
    )]
    /// Base URL of the image generation API
    pub stability_base_url: String,
}
