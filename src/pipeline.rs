//! The generation pipeline: script, panel images, composition, storage.

use std::sync::Arc;

use image::{DynamicImage, ImageError};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, instrument, warn};

use crate::constants::PANEL_STYLE_DESCRIPTION;
use crate::error::ComicError;
use crate::media::{MediaStore, encode_png};
use crate::providers::{PanelImageGenerator, ScriptGenerator};
use crate::render::strip::{PanelArt, assemble};
use crate::render::{Fonts, placeholder_image};
use crate::script::{ComicScript, PanelScript, build_script_prompt};

/// What the client asks for.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ComicRequest {
    /// The learning objective.
    #[serde(default)]
    pub prompt: String,
    /// Optional story topic
    #[serde(default)]
    pub topic: Option<String>,
    /// Optional school subject
    #[serde(default)]
    pub subject: Option<String>,
    /// Optional age group, eg `8-10`
    #[serde(default)]
    pub age_group: Option<String>,
    /// Cultural elements to weave into the story.
    #[serde(default, deserialize_with = "cultural_elements")]
    pub cultural_elements: Vec<String>,
}

/// Accepts a list, a JSON-encoded list in a string, or a single string.
fn cultural_elements<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Elements {
        List(Vec<String>),
        Text(String),
        Missing(()),
    }

    let elements = match Elements::deserialize(deserializer)? {
        Elements::List(list) => list,
        Elements::Text(text) => serde_json::from_str::<Vec<String>>(&text)
            .unwrap_or_else(|_| vec![text]),
        Elements::Missing(()) => Vec::new(),
    };
    Ok(elements
        .into_iter()
        .map(|element| element.trim().to_string())
        .filter(|element| !element.is_empty())
        .collect())
}

/// One rendered panel.
#[derive(Clone, Debug, Serialize)]
pub struct GeneratedPanel {
    /// Parsed panel text
    #[serde(flatten)]
    pub script: PanelScript,
    /// Path relative to the media root of the image used for the panel.
    pub image_path: String,
    /// True when the image provider failed and the placeholder was used.
    pub placeholder: bool,
}

/// Result of a successful generation.
#[derive(Clone, Debug)]
pub struct GeneratedComic {
    /// Script text and panel breakdown
    pub script: ComicScript,
    /// Per-panel images
    pub panels: Vec<GeneratedPanel>,
    /// Stitched strip, relative to the media root.
    pub strip_path: String,
}

impl GeneratedComic {
    /// Number of panels that fell back to the placeholder.
    pub fn placeholder_count(&self) -> usize {
        self.panels.iter().filter(|panel| panel.placeholder).count()
    }
}

/// Full decode on a blocking thread; a valid header alone is not enough.
async fn decode_image(
    bytes: Vec<u8>,
) -> Result<(Vec<u8>, Result<DynamicImage, ImageError>), ComicError> {
    Ok(tokio::task::spawn_blocking(move || {
        let decoded = image::load_from_memory(&bytes);
        (bytes, decoded)
    })
    .await?)
}

/// Runs one request through every stage, in order.
pub struct ComicPipeline {
    script_generator: Arc<dyn ScriptGenerator>,
    image_generator: Arc<dyn PanelImageGenerator>,
    media: MediaStore,
    panel_count: usize,
}

impl std::fmt::Debug for ComicPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComicPipeline")
            .field("media", &self.media)
            .field("panel_count", &self.panel_count)
            .finish_non_exhaustive()
    }
}

impl ComicPipeline {
    /// `panel_count` of zero is treated as one.
    pub fn new(
        script_generator: Arc<dyn ScriptGenerator>,
        image_generator: Arc<dyn PanelImageGenerator>,
        media: MediaStore,
        panel_count: usize,
    ) -> Self {
        Self {
            script_generator,
            image_generator,
            media,
            panel_count: panel_count.max(1),
        }
    }

    /// Where generated files go.
    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    /// Panels per strip.
    pub fn panel_count(&self) -> usize {
        self.panel_count
    }

    /// Generates, composites and stores a comic. Only script failures and
    /// local IO errors are returned; image failures become placeholders.
    #[instrument(level = "info", skip_all)]
    pub async fn generate(&self, request: &ComicRequest) -> Result<GeneratedComic, ComicError> {
        let objective = request.prompt.trim();
        if objective.is_empty() {
            return Err(ComicError::BadRequest(
                "prompt (the learning objective) is required".to_string(),
            ));
        }

        let prompt = build_script_prompt(
            objective,
            request.topic.as_deref(),
            &request.cultural_elements,
            self.panel_count,
        );
        let text = self.script_generator.generate_script(&prompt).await?;
        if text.trim().is_empty() {
            return Err(ComicError::ScriptGeneration(
                "text provider returned an empty script".to_string(),
            ));
        }
        let script = ComicScript::parse(&text, self.panel_count);
        info!("Script generated with {} panels", script.panels.len());

        self.media.ensure_placeholder().await?;
        let mut panels = Vec::with_capacity(script.panels.len());
        let mut artwork = Vec::with_capacity(script.panels.len());
        for (idx, panel) in script.panels.iter().enumerate() {
            let prompt = format!("{}. {}", panel.scene, PANEL_STYLE_DESCRIPTION);
            info!("Requesting image for panel {}", idx + 1);
            let decoded = match self.image_generator.generate_image(&prompt).await {
                Ok(bytes) => match decode_image(bytes).await? {
                    (bytes, Ok(image)) => Some((bytes, image)),
                    (_, Err(err)) => {
                        warn!("Panel {} image could not be decoded: {err}", idx + 1);
                        None
                    }
                },
                Err(err) => {
                    warn!("Panel {} image generation failed: {err}", idx + 1);
                    None
                }
            };

            let (image_path, image) = match decoded {
                Some((bytes, image)) => (self.media.save_panel(idx, &bytes).await?, Some(image)),
                None => (self.media.placeholder_relative().to_string(), None),
            };
            panels.push(GeneratedPanel {
                script: panel.clone(),
                placeholder: image.is_none(),
                image_path,
            });
            artwork.push(image);
        }

        let title = objective.to_string();
        let scripts: Vec<PanelScript> = script.panels.clone();
        let strip_png = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ComicError> {
            let fonts = Fonts::load()?;
            let placeholder = DynamicImage::ImageRgb8(placeholder_image()?);
            let art: Vec<PanelArt> = artwork
                .into_iter()
                .zip(scripts)
                .map(|(image, script)| PanelArt {
                    image: image.unwrap_or_else(|| placeholder.clone()),
                    script,
                })
                .collect();
            encode_png(&assemble(&fonts, &art, &title))
        })
        .await??;

        let strip_path = self.media.save_strip(&strip_png).await?;
        info!(
            "Comic strip saved to {} ({} placeholder panel(s))",
            strip_path,
            panels.iter().filter(|panel| panel.placeholder).count()
        );

        Ok(GeneratedComic {
            script,
            panels,
            strip_path,
        })
    }
}
