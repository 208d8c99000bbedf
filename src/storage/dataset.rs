//! CSV dataset with a fixed header.

use std::path::{Path, PathBuf};

use std::io::SeekFrom;

use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::error::{AppError, Result};
use crate::models::{COLUMNS, DatasetRecord};
use crate::storage::cache::ensure_parent;

/// Append-only CSV store, one row per processed URL.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    /// Open the dataset, writing the header if the file is new.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { path: path.into() };
        store.ensure_initialized().await?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with the header row. Existing content is never touched.
    ///
    /// An existing file whose last row was cut short gets a line break, so
    /// the next row starts on its own line.
    pub async fn ensure_initialized(&self) -> Result<()> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.len() > 0 => return self.terminate_last_row().await,
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ensure_parent(&self.path).await?;
            }
            Err(e) => return Err(AppError::Io(e)),
        }

        let header = encode_row(COLUMNS.iter().copied())?;
        self.write_durably(&header).await?;
        log::debug!("Initialized dataset at {}", self.path.display());
        Ok(())
    }

    /// Append one record and sync it to disk.
    pub async fn append(&self, record: &DatasetRecord) -> Result<()> {
        let row = record.to_row();
        let bytes = encode_row(row.iter().map(String::as_str))?;
        self.write_durably(&bytes).await
    }

    /// Read all complete data rows (header excluded).
    ///
    /// Rows that do not have every column are left over from an interrupted
    /// write and are skipped.
    pub fn read_rows(&self) -> Result<Vec<csv::StringRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.len() == COLUMNS.len() {
                rows.push(record);
            } else {
                log::warn!(
                    "Skipping incomplete row at line {} of {}",
                    record.position().map(|p| p.line()).unwrap_or_default(),
                    self.path.display()
                );
            }
        }
        Ok(rows)
    }

    async fn terminate_last_row(&self) -> Result<()> {
        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::End(-1)).await?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last).await?;
        drop(file);

        if last[0] != b'\n' {
            log::warn!(
                "{} ends with an incomplete row, starting a new line",
                self.path.display()
            );
            self.write_durably(b"\n").await?;
        }
        Ok(())
    }

    async fn write_durably(&self, bytes: &[u8]) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AppError::persistence(&self.path, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| AppError::persistence(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| AppError::persistence(&self.path, e))?;
        file.sync_data()
            .await
            .map_err(|e| AppError::persistence(&self.path, e))?;
        Ok(())
    }
}

/// Encode a single CSV row, quoting as needed.
fn encode_row<'a>(cells: impl IntoIterator<Item = &'a str>) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(cells)?;
    writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaKind, MediaPost};
    use tempfile::TempDir;

    fn sample_record() -> DatasetRecord {
        DatasetRecord::from_post(
            "https://example.test/p/ABC123/",
            MediaPost {
                kind: MediaKind::Photo,
                title: None,
                description: Some("line one\nline two, with \"quotes\"".to_string()),
                photo: Some("https://cdn.example.test/a.jpg".to_string()),
                video: None,
                resources: vec![],
                account_name: "someone".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_header_written_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.csv");

        let store = DatasetStore::open(&path).await.unwrap();
        store.append(&sample_record()).await.unwrap();

        // Reopening must not rewrite the file
        let store = DatasetStore::open(&path).await.unwrap();
        store.append(&sample_record()).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("url,media_type,media_path").count(), 1);
        assert!(content.starts_with(&COLUMNS.join(",")));
        assert_eq!(store.read_rows().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rows_round_trip_multiline_cells() {
        let tmp = TempDir::new().unwrap();
        let store = DatasetStore::open(tmp.path().join("data.csv")).await.unwrap();
        store.append(&sample_record()).await.unwrap();

        let rows = store.read_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), COLUMNS.len());
        assert_eq!(&rows[0][4], "line one\nline two, with \"quotes\"");
        assert_eq!(&rows[0][8], "OK");
        assert_eq!(&rows[0][18], "");
    }

    #[tokio::test]
    async fn test_torn_last_row_is_not_joined() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.csv");
        let header = COLUMNS.join(",");
        std::fs::write(&path, format!("{header}\nhttps://example.test/p/A/,photo")).unwrap();

        let store = DatasetStore::open(&path).await.unwrap();
        store
            .append(&DatasetRecord::login_required("https://example.test/p/B/"))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "https://example.test/p/A/,photo");
        assert!(lines[2].starts_with("https://example.test/p/B/,"));

        let rows = store.read_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "https://example.test/p/B/");
        assert_eq!(&rows[0][8], "LOGIN_REQUIRED");
    }

    #[tokio::test]
    async fn test_reopen_complete_file_adds_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.csv");

        let store = DatasetStore::open(&path).await.unwrap();
        store.append(&sample_record()).await.unwrap();
        let before = std::fs::read(&path).unwrap();

        DatasetStore::open(&path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_empty_existing_file_gets_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.csv");
        std::fs::write(&path, "").unwrap();

        let store = DatasetStore::open(&path).await.unwrap();
        assert!(store.read_rows().unwrap().is_empty());
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("url,"));
    }
}
