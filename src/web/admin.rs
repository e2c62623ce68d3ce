use super::csrf::{csrf_token, validate_csrf};
use super::flash::{Flash, set_flash, take_flash};
use super::prelude::*;
use super::views::ComicSummary;
use tracing::instrument;

#[derive(Deserialize)]
pub(crate) struct DeleteForm {
    csrf_token: String,
}

#[derive(Clone, Debug)]
struct AdminComicView {
    summary: ComicSummary,
    panel_count: i32,
    placeholder_count: i32,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub(crate) struct AdminTemplate {
    comics: Vec<AdminComicView>,
    has_comics: bool,
    csrf_token: String,
    has_flash: bool,
    flash_message: String,
    flash_class: String,
}

/// GET /admin/
pub(crate) async fn admin_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<AdminTemplate, ComicError> {
    let comics: Vec<AdminComicView> = comic_strips::Entity::recent(&state.db, None)
        .await?
        .iter()
        .map(|model| AdminComicView {
            summary: ComicSummary::new(&state, model),
            panel_count: model.panel_count,
            placeholder_count: model.placeholder_count,
        })
        .collect();

    let csrf_token = csrf_token(&session).await?;
    let (has_flash, flash_message, flash_class) = match take_flash(&session).await? {
        Some(flash) => (true, flash.message(), flash.class().to_string()),
        None => (false, String::new(), String::new()),
    };
    Ok(AdminTemplate {
        has_comics: !comics.is_empty(),
        comics,
        csrf_token,
        has_flash,
        flash_message,
        flash_class,
    })
}

/// POST /admin/comics/{id}/delete
#[instrument(level = "info", skip(state, session, form))]
pub(crate) async fn delete_comic_handler(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect, ComicError> {
    validate_csrf(&session, &form.csrf_token).await?;

    let deleted =
        comic_strips::Entity::delete_with_files(&state.db, state.pipeline.media(), id).await?;
    let flash = if deleted {
        info!("Deleted comic {id}");
        Flash::ComicDeleted(id)
    } else {
        Flash::ComicMissing(id)
    };
    set_flash(&session, flash).await?;
    Ok(Redirect::to("/admin/"))
}
