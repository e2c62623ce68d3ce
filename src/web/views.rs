use axum::http::HeaderMap;
use axum::response::Response;

use super::api::generate_and_record;
use super::images::strip_response;
use super::prelude::*;
use crate::constants::RECENT_COMICS_LIMIT;
use crate::pipeline::ComicRequest;
use crate::script::{ComicScript, PanelScript};

#[derive(Clone, Debug)]
pub(crate) struct ComicSummary {
    pub(crate) id: i32,
    pub(crate) prompt: String,
    pub(crate) image_url: String,
    pub(crate) created_at: String,
}

impl ComicSummary {
    pub(crate) fn new(state: &AppState, model: &comic_strips::Model) -> Self {
        Self {
            id: model.id,
            prompt: model.prompt.clone(),
            image_url: state.pipeline.media().url_for(&model.image_path),
            created_at: model.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub(crate) struct HomeTemplate {
    pub(crate) panel_count: usize,
    pub(crate) recent: Vec<ComicSummary>,
}

#[derive(Template, WebTemplate)]
#[template(path = "comic.html")]
pub(crate) struct ComicTemplate {
    pub(crate) comic: ComicSummary,
    pub(crate) topic: String,
    pub(crate) subject: String,
    pub(crate) age_group: String,
    pub(crate) panels: Vec<PanelScript>,
    pub(crate) script: String,
    pub(crate) placeholder_count: i32,
}

#[derive(Deserialize, Debug)]
pub(crate) struct GenerateForm {
    prompt: String,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    age_group: String,
    #[serde(default)]
    cultural_elements: String,
}

fn optional(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

impl From<GenerateForm> for ComicRequest {
    fn from(form: GenerateForm) -> Self {
        ComicRequest {
            prompt: form.prompt,
            topic: optional(form.topic),
            subject: optional(form.subject),
            age_group: optional(form.age_group),
            cultural_elements: form
                .cultural_elements
                .split(',')
                .map(|element| element.trim().to_string())
                .filter(|element| !element.is_empty())
                .collect(),
        }
    }
}

/// handles the / GET
pub(crate) async fn home_handler(State(state): State<AppState>) -> Result<HomeTemplate, ComicError> {
    let recent = comic_strips::Entity::recent(&state.db, Some(RECENT_COMICS_LIMIT))
        .await?
        .iter()
        .map(|model| ComicSummary::new(&state, model))
        .collect();
    Ok(HomeTemplate {
        panel_count: state.pipeline.panel_count(),
        recent,
    })
}

/// POST /comics from the home page form
pub(crate) async fn generate_form_handler(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<Redirect, ComicError> {
    let request = ComicRequest::from(form);
    let (model, _) = generate_and_record(&state, &request).await?;
    Ok(Redirect::to(&format!("/comics/{}", model.id)))
}

async fn find_comic(state: &AppState, id: i32) -> Result<comic_strips::Model, ComicError> {
    comic_strips::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ComicError::NotFound(format!("comic {id}")))
}

/// GET /comics/{id}
pub(crate) async fn comic_page_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ComicTemplate, ComicError> {
    let model = find_comic(&state, id).await?;
    let panel_count = usize::try_from(model.panel_count).unwrap_or(0).max(1);
    let panels = ComicScript::parse(&model.script, panel_count).panels;
    Ok(ComicTemplate {
        comic: ComicSummary::new(&state, &model),
        topic: model.topic.clone().unwrap_or_default(),
        subject: model.subject.clone().unwrap_or_default(),
        age_group: model.age_group.clone().unwrap_or_default(),
        panels,
        script: model.script,
        placeholder_count: model.placeholder_count,
    })
}

/// GET /comics/{id}/image
pub(crate) async fn strip_image_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<Response, ComicError> {
    let model = find_comic(&state, id).await?;
    strip_response(state.pipeline.media(), &model, &headers).await
}
