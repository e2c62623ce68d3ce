//! Config handling

use tracing::log::LevelFilter;

use crate::cli::CliOptions;
use crate::media::MediaStore;
use crate::pipeline::ComicPipeline;
use crate::providers::gemini::GeminiClient;
use crate::providers::stability::StabilityClient;
use crate::providers::ProviderError;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("sqlx", LevelFilter::Warn)
            .with_module_level("sea_orm_migration", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Builds the generation pipeline from the CLI options.
pub fn build_pipeline(cli: &CliOptions) -> Result<ComicPipeline, ProviderError> {
    if cli.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set, script generation will fail");
    }
    if cli.stability_api_key.is_none() {
        tracing::warn!("STABILITY_API_KEY is not set, every panel will use the placeholder");
    }

    let script_generator = GeminiClient::new(
        &cli.gemini_base_url,
        &cli.text_model,
        cli.gemini_api_key.clone(),
    )?;
    let image_generator =
        StabilityClient::new(&cli.stability_base_url, cli.stability_api_key.clone())?;
    let media = MediaStore::new(cli.media_dir.clone(), &cli.media_url);

    Ok(ComicPipeline::new(
        std::sync::Arc::new(script_generator),
        std::sync::Arc::new(image_generator),
        media,
        usize::from(cli.panel_count),
    ))
}
