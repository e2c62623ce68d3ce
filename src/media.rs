//! On-disk storage for the placeholder, generated panels and stitched strips.

use std::io::{Cursor, ErrorKind};
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use image::{ImageFormat, RgbImage};
use tracing::{debug, info};

use crate::constants::{GENERATED_IMAGES_DIR, PLACEHOLDER_FILENAME};
use crate::error::ComicError;
use crate::render;

/// Media root plus the URL prefix it is served under.
#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

/// Encodes an image as PNG.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ComicError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Content type for a stored file, by extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

impl MediaStore {
    /// `url_prefix` gains a trailing slash if it lacks one.
    pub fn new(root: PathBuf, url_prefix: &str) -> Self {
        let mut url_prefix = url_prefix.trim().to_string();
        if !url_prefix.ends_with('/') {
            url_prefix.push('/');
        }
        Self { root, url_prefix }
    }

    /// The media root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL prefix, always ending in `/`.
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Path of the placeholder relative to the media root.
    pub fn placeholder_relative(&self) -> &'static str {
        PLACEHOLDER_FILENAME
    }

    /// Writes the placeholder image if it is not on disk yet.
    pub async fn ensure_placeholder(&self) -> Result<PathBuf, ComicError> {
        let path = self.root.join(PLACEHOLDER_FILENAME);
        if tokio::fs::try_exists(&path).await? {
            return Ok(path);
        }
        tokio::fs::create_dir_all(&self.root).await?;
        let bytes = encode_png(&render::placeholder_image()?)?;
        tokio::fs::write(&path, bytes).await?;
        info!("Wrote placeholder image to {}", path.display());
        Ok(path)
    }

    async fn save_generated(&self, filename: String, bytes: &[u8]) -> Result<String, ComicError> {
        let dir = self.root.join(GENERATED_IMAGES_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes).await?;
        debug!("Saved {}", path.display());
        Ok(format!("{GENERATED_IMAGES_DIR}/{filename}"))
    }

    /// Stores a generated panel image, returns its path relative to the root.
    pub async fn save_panel(&self, index: usize, bytes: &[u8]) -> Result<String, ComicError> {
        let extension = image::guess_format(bytes)
            .ok()
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("png");
        self.save_generated(
            format!("panel_{}_{}.{}", index + 1, unique_suffix(), extension),
            bytes,
        )
        .await
    }

    /// Stores a stitched strip, returns its path relative to the root.
    pub async fn save_strip(&self, png: &[u8]) -> Result<String, ComicError> {
        self.save_generated(format!("stitched_comic_{}.png", unique_suffix()), png)
            .await
    }

    /// Public URL for a path relative to the root.
    pub fn url_for(&self, relative: &str) -> String {
        format!("{}{}", self.url_prefix, relative.trim_start_matches('/'))
    }

    /// Absolute path for a stored relative path; rejects anything escaping the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ComicError> {
        let relative = Path::new(relative);
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if escapes || relative.as_os_str().is_empty() {
            return Err(ComicError::BadRequest(format!(
                "Invalid media path {}",
                relative.display()
            )));
        }
        Ok(self.root.join(relative))
    }

    /// Deletes a stored file; a file that is already gone is fine.
    pub async fn remove(&self, relative: &str) -> Result<(), ComicError> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn unique_suffix() -> String {
    format!(
        "{}_{:08x}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        rand::random::<u32>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn placeholder_is_created_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MediaStore::new(dir.path().join("media"), "/media");
        let path = store.ensure_placeholder().await.expect("placeholder");
        assert!(path.exists());
        let decoded = image::open(&path).expect("decode placeholder");
        assert_eq!(decoded.width(), crate::constants::PANEL_WIDTH);
        assert_eq!(decoded.height(), crate::constants::PANEL_HEIGHT);

        let again = store.ensure_placeholder().await.expect("placeholder");
        assert_eq!(path, again);
    }

    #[tokio::test]
    async fn saved_strips_resolve_to_urls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MediaStore::new(dir.path().to_path_buf(), "/media");
        let relative = store.save_strip(b"not really a png").await.expect("save");
        assert!(relative.starts_with("generated_images/stitched_comic_"));
        assert!(store.resolve(&relative).expect("resolve").exists());
        assert_eq!(store.url_for(&relative), format!("/media/{relative}"));

        store.remove(&relative).await.expect("remove");
        assert!(!store.resolve(&relative).expect("resolve").exists());
        store.remove(&relative).await.expect("second remove is fine");
    }

    #[tokio::test]
    async fn panel_extension_follows_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MediaStore::new(dir.path().to_path_buf(), "/media/");
        let png = encode_png(&RgbImage::new(2, 2)).expect("encode");
        let relative = store.save_panel(0, &png).await.expect("save");
        assert!(relative.starts_with("generated_images/panel_1_"));
        assert!(relative.ends_with(".png"));
    }

    #[test]
    fn parent_components_are_rejected() {
        let store = MediaStore::new(PathBuf::from("/srv/media"), "/media/");
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("generated_images/a.png").is_ok());
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for(Path::new("a.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.bin")), "application/octet-stream");
    }
}
