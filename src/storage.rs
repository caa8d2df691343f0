//! Writes generated images to the image directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{error, info};

use crate::constants::{FILENAME_PREFIX_CHARS, IMAGE_URL_PREFIX};
use crate::generator::GeneratedImage;

/// Failure to persist an image.
#[derive(Debug)]
pub enum StorageError {
    /// Creating the directory or writing the file failed.
    Io(std::io::Error),
    /// The image could not be encoded as PNG.
    Encode(image::ImageError),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Failed to write image: {err}"),
            Self::Encode(err) => write!(f, "Failed to encode image: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for StorageError {
    fn from(err: image::ImageError) -> Self {
        Self::Encode(err)
    }
}

/// `<first 10 chars of raw text>_<timestamp>.png`.
///
/// The prefix is kept verbatim, trailing whitespace included, apart from path
/// separators and NUL which become `_`.
pub fn image_filename(raw_text: &str, timestamp: i64) -> String {
    let prefix: String = raw_text
        .chars()
        .take(FILENAME_PREFIX_CHARS)
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    format!("{prefix}_{timestamp}.png")
}

/// An image that has been written to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedImage {
    /// Name of the file inside the image directory.
    pub filename: String,
    /// Full path of the written file.
    pub path: PathBuf,
}

impl SavedImage {
    /// Path the web server serves this image under, percent-encoded.
    pub fn url_path(&self) -> String {
        let mut url = match url::Url::parse("http://localhost/") {
            Ok(url) => url,
            Err(_) => return format!("{IMAGE_URL_PREFIX}/{}", self.filename),
        };
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .clear()
                .push(IMAGE_URL_PREFIX.trim_start_matches('/'))
                .push(&self.filename);
        }
        url.path().to_string()
    }
}

/// Directory generated images are written into.
#[derive(Clone, Debug)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// A store rooted at `dir`; the directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The image directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Saves `image` named after `raw_text` and the current unix time.
    pub async fn save(
        &self,
        image: &GeneratedImage,
        raw_text: &str,
    ) -> Result<SavedImage, StorageError> {
        self.save_at(image, raw_text, Utc::now().timestamp()).await
    }

    /// Saves `image` with an explicit timestamp. An existing file with the same
    /// name is overwritten.
    pub async fn save_at(
        &self,
        image: &GeneratedImage,
        raw_text: &str,
        timestamp: i64,
    ) -> Result<SavedImage, StorageError> {
        tokio::fs::create_dir_all(&self.dir).await.inspect_err(|err| {
            error!("Failed to create {}: {err}", self.dir.display());
        })?;

        let filename = image_filename(raw_text, timestamp);
        let path = self.dir.join(&filename);
        let png = image.to_png()?;
        tokio::fs::write(&path, png).await?;
        info!("Image saved successfully to: {}", path.display());

        Ok(SavedImage { filename, path })
    }
}
