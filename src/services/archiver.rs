//! Per-post media download into `{media_root}/{identifier}/`.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::services::BlobFetcher;
use crate::utils::url::file_name;

/// Downloads post resources into one directory per post.
#[derive(Clone)]
pub struct MediaArchiver {
    media_root: PathBuf,
    fetcher: Arc<dyn BlobFetcher>,
}

impl MediaArchiver {
    pub fn new(media_root: impl Into<PathBuf>, fetcher: Arc<dyn BlobFetcher>) -> Self {
        Self {
            media_root: media_root.into(),
            fetcher,
        }
    }

    /// Directory holding the media of one post.
    pub fn post_dir(&self, identifier: &str) -> PathBuf {
        self.media_root.join(identifier)
    }

    /// Download one resource of a post.
    ///
    /// Returns the absolute post directory on success and `None` when the
    /// fetch failed; a failed fetch only affects this resource. Local file
    /// system errors are returned as persistence errors.
    pub async fn download(
        &self,
        identifier: &str,
        locator: &str,
        identity: &str,
        sequence: usize,
    ) -> Result<Option<PathBuf>> {
        let dir = self.post_dir(identifier);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::persistence(&dir, e))?;

        let name = file_name(locator).unwrap_or_else(|| format!("resource_{sequence}"));
        let file_path = dir.join(name);

        log::info!("[{sequence}] Fetching media of {identifier} ({locator})...");
        let bytes = match self.fetcher.fetch(locator, identity).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!(
                    "[{sequence}] Unexpected error while fetching media: {} - {}",
                    e.kind(),
                    e
                );
                return Ok(None);
            }
        };

        log::info!(
            "[{sequence}] Media fetched, saving {} byte(s) to {}",
            bytes.len(),
            file_path.display()
        );
        tokio::fs::write(&file_path, &bytes)
            .await
            .map_err(|e| AppError::persistence(&file_path, e))?;

        let dir = std::path::absolute(&dir).map_err(|e| AppError::persistence(&dir, e))?;
        Ok(Some(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::services::FetchError;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use tempfile::TempDir;

    /// Serves the locator itself as the body; locators containing "broken" fail.
    struct EchoFetcher;

    #[async_trait]
    impl BlobFetcher for EchoFetcher {
        async fn fetch(&self, locator: &str, _identity: &str) -> std::result::Result<Vec<u8>, FetchError> {
            if locator.contains("broken") {
                return Err(FetchError::Status(StatusCode::BAD_GATEWAY));
            }
            Ok(locator.as_bytes().to_vec())
        }
    }

    fn archiver(root: &Path) -> MediaArchiver {
        MediaArchiver::new(root.join("media"), Arc::new(EchoFetcher))
    }

    #[tokio::test]
    async fn test_download_writes_into_post_dir() {
        let tmp = TempDir::new().unwrap();
        let archiver = archiver(tmp.path());

        let locator = "https://cdn.example.test/v/photo.jpg?stp=1";
        let dir = archiver
            .download("ABC123", locator, "agent", 1)
            .await
            .unwrap()
            .unwrap();

        assert!(dir.is_absolute());
        assert!(dir.ends_with("media/ABC123"));
        let saved = std::fs::read(dir.join("photo.jpg")).unwrap();
        assert_eq!(saved, locator.as_bytes());
    }

    #[tokio::test]
    async fn test_failed_fetch_returns_none() {
        let tmp = TempDir::new().unwrap();
        let archiver = archiver(tmp.path());

        let result = archiver
            .download("ABC123", "https://cdn.example.test/broken.jpg", "agent", 2)
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(archiver.post_dir("ABC123").is_dir());
        assert!(!archiver.post_dir("ABC123").join("broken.jpg").exists());
    }

    #[tokio::test]
    async fn test_redownload_overwrites() {
        let tmp = TempDir::new().unwrap();
        let archiver = archiver(tmp.path());
        let dir = archiver.post_dir("X");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.jpg"), b"stale bytes from an earlier run").unwrap();

        archiver
            .download("X", "https://cdn.example.test/a.jpg", "agent", 1)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read(dir.join("a.jpg")).unwrap(),
            b"https://cdn.example.test/a.jpg"
        );
    }

    #[tokio::test]
    async fn test_locator_without_basename_uses_sequence() {
        let tmp = TempDir::new().unwrap();
        let archiver = archiver(tmp.path());

        archiver
            .download("X", "https://cdn.example.test/", "agent", 7)
            .await
            .unwrap();

        assert!(archiver.post_dir("X").join("resource_7").exists());
    }
}
