//! DB storage for generated comic strips
use sea_orm::{ActiveValue::Set, QueryOrder, QuerySelect, entity::prelude::*};

use crate::error::ComicError;
use crate::media::MediaStore;
use crate::pipeline::{ComicRequest, GeneratedComic};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "comic_strips")]
/// One generated comic, written once and never updated.
pub struct Model {
    #[sea_orm(primary_key)]
    /// db id
    pub id: i32,
    /// the learning objective
    pub prompt: String,
    /// optional story topic
    pub topic: Option<String>,
    /// optional school subject
    pub subject: Option<String>,
    /// optional age group
    pub age_group: Option<String>,
    /// raw script text from the text model
    pub script: String,
    /// stitched strip, relative to the media root
    pub image_path: String,
    /// panels in the strip
    pub panel_count: i32,
    /// panels that fell back to the placeholder
    pub placeholder_count: i32,
    /// JSON list of per-panel image paths, relative to the media root
    pub panel_images: String,
    /// when it was generated
    pub created_at: DateTime,
}

/// comic strips stand alone
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Per-panel image paths, in panel order. Empty if the column is unreadable.
    pub fn panel_images(&self) -> Vec<String> {
        serde_json::from_str(&self.panel_images).unwrap_or_default()
    }
}

fn count(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Entity {
    /// Stores a finished generation.
    pub async fn record(
        db: &DatabaseConnection,
        request: &ComicRequest,
        comic: &GeneratedComic,
    ) -> Result<Model, ComicError> {
        let panel_images: Vec<&str> = comic
            .panels
            .iter()
            .map(|panel| panel.image_path.as_str())
            .collect();
        let panel_images = serde_json::to_string(&panel_images)
            .map_err(|err| ComicError::InternalServerError(err.to_string()))?;
        let active = ActiveModel {
            prompt: Set(request.prompt.trim().to_string()),
            topic: Set(non_empty(request.topic.as_ref())),
            subject: Set(non_empty(request.subject.as_ref())),
            age_group: Set(non_empty(request.age_group.as_ref())),
            script: Set(comic.script.text.clone()),
            image_path: Set(comic.strip_path.clone()),
            panel_count: Set(count(comic.panels.len())),
            placeholder_count: Set(count(comic.placeholder_count())),
            panel_images: Set(panel_images),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };
        Ok(active.insert(db).await?)
    }

    /// Newest first, all of them when `limit` is `None`.
    pub async fn recent(db: &DatabaseConnection, limit: Option<u64>) -> Result<Vec<Model>, DbErr> {
        Self::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(db)
            .await
    }

    /// Deletes the record, its strip and its panel images; the shared
    /// placeholder stays. Returns false if there was no such comic.
    pub async fn delete_with_files(
        db: &DatabaseConnection,
        media: &MediaStore,
        id: i32,
    ) -> Result<bool, ComicError> {
        let Some(model) = Self::find_by_id(id).one(db).await? else {
            return Ok(false);
        };
        Self::delete_by_id(model.id).exec(db).await?;
        media.remove(&model.image_path).await?;
        for path in model.panel_images() {
            if path != media.placeholder_relative() {
                media.remove(&path).await?;
            }
        }
        Ok(true)
    }
}
