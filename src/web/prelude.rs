pub(crate) use crate::db::entities::comic_strips;
pub(crate) use crate::error::ComicError;
pub(crate) use crate::web::AppState;
pub(crate) use askama::Template;
pub(crate) use askama_web::WebTemplate;
pub(crate) use axum::extract::{Form, Path, State};
pub(crate) use axum::http::StatusCode;
pub(crate) use axum::response::Redirect;
pub(crate) use sea_orm::EntityTrait;
pub(crate) use serde::{Deserialize, Serialize};
pub(crate) use tower_sessions::Session;
pub(crate) use tracing::info;
