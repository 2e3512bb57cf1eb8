use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::config::MediaConfig;

const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error(
        "Upload a valid image. The file you uploaded was either not an image or a corrupted image"
    )]
    InvalidImage(String),

    #[error("Failed to store image: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Image decoding task failed: {0}")]
    Task(String),
}

/// Validates uploaded images and keeps them under the media root.
pub struct ImageService {
    media_root: PathBuf,
    media_url: String,
}

impl ImageService {
    #[must_use]
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            media_root: PathBuf::from(&config.media_root),
            media_url: config.media_url.trim_end_matches('/').to_string(),
        }
    }

    /// Decode `bytes` and write them to a fresh file.
    ///
    /// Returns the path relative to the media root.
    pub async fn save_recipe_image(&self, bytes: Vec<u8>) -> Result<String, ImageError> {
        let (bytes, format) = tokio::task::spawn_blocking(move || {
            detect_image_format(&bytes).map(|format| (bytes, format))
        })
        .await
        .map_err(|e| ImageError::Task(e.to_string()))??;

        let extension = format.extensions_str().first().copied().unwrap_or("img");
        let relative = format!("{RECIPE_IMAGE_DIR}/{}.{extension}", uuid::Uuid::new_v4());

        let file_path = self.media_root.join(&relative);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&file_path, &bytes).await?;
        info!(path = %file_path.display(), size = bytes.len(), "Stored recipe image");

        Ok(relative)
    }

    /// Delete a stored file. Failures are logged, not returned.
    pub async fn remove(&self, relative: &str) {
        let Some(path) = self.resolve(relative) else {
            warn!(path = %relative, "Refusing to remove path outside the media root");
            return;
        };

        if let Err(e) = fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove stored image");
        }
    }

    /// Public URL of a stored file.
    #[must_use]
    pub fn url_for(&self, relative: &str) -> String {
        format!("{}/{}", self.media_url, relative.trim_start_matches('/'))
    }

    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let path = Path::new(relative);
        let is_plain = path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        is_plain.then(|| self.media_root.join(path))
    }
}

/// Fully decode the payload so truncated or corrupted files are rejected too.
fn detect_image_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::InvalidImage(e.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| ImageError::InvalidImage("unrecognized format".to_string()))?;

    reader
        .decode()
        .map_err(|e| ImageError::InvalidImage(e.to_string()))?;

    Ok(format)
}
