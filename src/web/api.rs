//! JSON API
use axum::Json;
use axum::extract::rejection::JsonRejection;

use super::prelude::*;
use crate::media::MediaStore;
use crate::pipeline::{ComicRequest, GeneratedComic};
use crate::script::{ComicScript, PanelScript};

/// Panel as returned to API clients.
#[derive(Debug, Serialize)]
pub(crate) struct PanelResponse {
    #[serde(flatten)]
    script: PanelScript,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    placeholder: Option<bool>,
}

/// Body of a generation or lookup response.
#[derive(Debug, Serialize)]
pub(crate) struct ComicResponse {
    pub(crate) id: i32,
    pub(crate) prompt: String,
    pub(crate) script: String,
    pub(crate) panels: Vec<PanelResponse>,
    pub(crate) image_url: String,
    pub(crate) page_url: String,
    pub(crate) warning: Option<String>,
    pub(crate) created_at: String,
}

fn placeholder_warning(count: i32, total: i32) -> Option<String> {
    (count > 0).then(|| {
        format!("Image generation failed for {count} of {total} panel(s), placeholders were used")
    })
}

impl ComicResponse {
    pub(crate) fn generated(
        media: &MediaStore,
        model: &comic_strips::Model,
        comic: &GeneratedComic,
    ) -> Self {
        let panels = comic
            .panels
            .iter()
            .map(|panel| PanelResponse {
                script: panel.script.clone(),
                image_url: Some(media.url_for(&panel.image_path)),
                placeholder: Some(panel.placeholder),
            })
            .collect();
        Self::build(media, model, panels)
    }

    /// Rebuilds the generation response from a stored record; panels are
    /// re-parsed from the script and matched to the stored image paths.
    pub(crate) fn stored(media: &MediaStore, model: &comic_strips::Model) -> Self {
        let panel_count = usize::try_from(model.panel_count).unwrap_or(0).max(1);
        let mut images = model.panel_images().into_iter();
        let panels = ComicScript::parse(&model.script, panel_count)
            .panels
            .into_iter()
            .map(|script| {
                let image_path = images.next();
                PanelResponse {
                    script,
                    placeholder: image_path
                        .as_deref()
                        .map(|path| path == media.placeholder_relative()),
                    image_url: image_path.map(|path| media.url_for(&path)),
                }
            })
            .collect();
        Self::build(media, model, panels)
    }

    fn build(media: &MediaStore, model: &comic_strips::Model, panels: Vec<PanelResponse>) -> Self {
        Self {
            id: model.id,
            prompt: model.prompt.clone(),
            script: model.script.clone(),
            panels,
            image_url: media.url_for(&model.image_path),
            page_url: format!("/comics/{}", model.id),
            warning: placeholder_warning(model.placeholder_count, model.panel_count),
            created_at: model.created_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }
}

/// Runs the pipeline and stores the result.
pub(crate) async fn generate_and_record(
    state: &AppState,
    request: &ComicRequest,
) -> Result<(comic_strips::Model, GeneratedComic), ComicError> {
    let comic = state.pipeline.generate(request).await?;
    let model = comic_strips::Entity::record(&state.db, request, &comic).await?;
    info!("Stored comic {} for prompt {:?}", model.id, model.prompt);
    Ok((model, comic))
}

/// POST /generate/
pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<ComicRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ComicResponse>), ComicError> {
    let Json(request) = payload.map_err(|err| ComicError::BadRequest(err.body_text()))?;
    let (model, comic) = generate_and_record(&state, &request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ComicResponse::generated(
            state.pipeline.media(),
            &model,
            &comic,
        )),
    ))
}

/// GET /api/comics/{id}
pub(crate) async fn comic_json_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ComicResponse>, ComicError> {
    let model = comic_strips::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ComicError::NotFound(format!("comic {id}")))?;
    Ok(Json(ComicResponse::stored(state.pipeline.media(), &model)))
}
