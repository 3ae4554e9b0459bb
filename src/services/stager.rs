use base64::Engine;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::instrument;

use crate::error::AppError;
use crate::models::file_types::{has_extension, IMAGE_EXTENSIONS};

/// An image the backend can read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedImage {
    path: PathBuf,
    temporary: bool,
}

impl StagedImage {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temporary: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    /// True when the file was written by the stager and is removed on cleanup.
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }
}

/// Materializes user-selected images to paths the backend can open.
pub struct ImageStager {
    directory: PathBuf,
    counter: AtomicU64,
    created: Mutex<Vec<PathBuf>>,
}

impl ImageStager {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            counter: AtomicU64::new(0),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Accepts an image that already lives on disk.
    pub async fn stage_path(&self, path: &str) -> Result<StagedImage, AppError> {
        if path.trim().is_empty() {
            return Err(AppError::Staging("Please choose an image file".into()));
        }
        if !has_extension(path, &IMAGE_EXTENSIONS) {
            return Err(AppError::Staging(format!(
                "Unsupported image type: {} (expected one of {})",
                path,
                IMAGE_EXTENSIONS.join(", ")
            )));
        }

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            AppError::Staging(format!("Cannot read image {}: {}", path, e))
        })?;
        if !metadata.is_file() {
            return Err(AppError::Staging(format!("{} is not a file", path)));
        }

        Ok(StagedImage::from_path(path))
    }

    /// Writes in-memory image data to the staging directory.
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn stage_bytes(&self, bytes: &[u8]) -> Result<StagedImage, AppError> {
        let format = image::guess_format(bytes)
            .map_err(|_| AppError::Staging("Please choose an image file".into()))?;
        let extension = format.extensions_str().first().copied().unwrap_or("img");

        tokio::fs::create_dir_all(&self.directory).await.map_err(|e| {
            AppError::Staging(format!(
                "Failed to create staging directory {}: {}",
                self.directory.display(),
                e
            ))
        })?;

        let path = self.directory.join(self.next_file_name(extension));
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            AppError::Staging(format!("Failed to write {}: {}", path.display(), e))
        })?;
        self.created.lock().await.push(path.clone());
        tracing::debug!(path = %path.display(), "Image staged");

        Ok(StagedImage {
            path,
            temporary: true,
        })
    }

    /// Accepts a `data:image/...;base64,` URL as produced by a browser file reader.
    pub async fn stage_data_url(&self, url: &str) -> Result<StagedImage, AppError> {
        let (mime, payload) = parse_data_url(url)?;
        if !mime.starts_with("image/") {
            return Err(AppError::Staging("Please choose an image file".into()));
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| AppError::Staging(format!("Invalid base64 image data: {}", e)))?;
        self.stage_bytes(&bytes).await
    }

    /// Deletes a temporary image that is no longer staged. Files the user
    /// picked from disk are never touched.
    pub async fn discard(&self, image: &StagedImage) {
        if !image.is_temporary() {
            return;
        }
        self.created
            .lock()
            .await
            .retain(|p| p.as_path() != image.path());
        if let Err(e) = tokio::fs::remove_file(image.path()).await {
            tracing::warn!("Failed to remove staged image {}: {}", image.path().display(), e);
        }
    }

    /// Removes every file this stager wrote.
    pub async fn cleanup(&self) {
        let mut created = self.created.lock().await;
        for path in created.drain(..) {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!("Failed to remove staged image {}: {}", path.display(), e);
            }
        }
    }

    fn next_file_name(&self, extension: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or_default();
        format!("staged-{}-{}-{}.{}", std::process::id(), nanos, n, extension)
    }
}

fn parse_data_url(url: &str) -> Result<(&str, &str), AppError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AppError::Staging("Not a data URL".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::Staging("Malformed data URL".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| AppError::Staging("Only base64 data URLs are supported".into()))?;
    let mime = mime.split(';').next().unwrap_or_default();
    Ok((mime, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[tokio::test]
    async fn stages_png_bytes_with_png_extension() {
        let dir = tempfile::tempdir().unwrap();
        let stager = ImageStager::new(dir.path().join("staging"));

        let staged = stager.stage_bytes(PNG_MAGIC).await.unwrap();
        assert!(staged.is_temporary());
        assert_eq!(staged.path().extension().unwrap(), "png");
        assert_eq!(tokio::fs::read(staged.path()).await.unwrap(), PNG_MAGIC);
    }

    #[tokio::test]
    async fn rejects_non_image_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let stager = ImageStager::new(dir.path());

        let err = stager.stage_bytes(b"just some text").await.unwrap_err();
        assert!(matches!(err, AppError::Staging(_)));
    }

    #[tokio::test]
    async fn decodes_image_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let stager = ImageStager::new(dir.path());
        let url = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(PNG_MAGIC)
        );

        let staged = stager.stage_data_url(&url).await.unwrap();
        assert_eq!(tokio::fs::read(staged.path()).await.unwrap(), PNG_MAGIC);
    }

    #[tokio::test]
    async fn rejects_non_image_mime() {
        let dir = tempfile::tempdir().unwrap();
        let stager = ImageStager::new(dir.path());
        let url = format!(
            "data:text/plain;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(b"hello")
        );

        let err = stager.stage_data_url(&url).await.unwrap_err();
        assert_eq!(err.to_string(), "Please choose an image file");
    }

    #[tokio::test]
    async fn stage_path_checks_extension_and_existence() {
        let dir = tempfile::tempdir().unwrap();
        let stager = ImageStager::new(dir.path());
        let image = dir.path().join("cat.jpg");
        tokio::fs::write(&image, b"not decoded here").await.unwrap();

        let staged = stager
            .stage_path(image.to_str().unwrap())
            .await
            .unwrap();
        assert!(!staged.is_temporary());

        assert!(stager.stage_path("").await.is_err());
        assert!(stager.stage_path("notes.txt").await.is_err());
        let missing = dir.path().join("missing.png");
        assert!(stager.stage_path(missing.to_str().unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn cleanup_removes_written_files() {
        let dir = tempfile::tempdir().unwrap();
        let stager = ImageStager::new(dir.path());

        let first = stager.stage_bytes(PNG_MAGIC).await.unwrap();
        let second = stager.stage_bytes(PNG_MAGIC).await.unwrap();
        assert_ne!(first.path(), second.path());

        stager.cleanup().await;
        assert!(!first.path().exists());
        assert!(!second.path().exists());
    }

    #[tokio::test]
    async fn discard_removes_only_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let stager = ImageStager::new(dir.path());

        let picked = dir.path().join("cat.png");
        tokio::fs::write(&picked, PNG_MAGIC).await.unwrap();
        let picked = stager.stage_path(picked.to_str().unwrap()).await.unwrap();
        stager.discard(&picked).await;
        assert!(picked.path().exists());

        let written = stager.stage_bytes(PNG_MAGIC).await.unwrap();
        stager.discard(&written).await;
        assert!(!written.path().exists());
        assert!(stager.created.lock().await.is_empty());
    }

    #[test]
    fn data_url_parsing() {
        assert_eq!(
            parse_data_url("data:image/jpeg;base64,AAAA").unwrap(),
            ("image/jpeg", "AAAA")
        );
        assert!(parse_data_url("image/jpeg;base64,AAAA").is_err());
        assert!(parse_data_url("data:image/jpeg,AAAA").is_err());
    }
}
