use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::{PriceMap, PriceStoreError};

/// The whole price map as one pretty-printed JSON object.
#[derive(Debug)]
pub(crate) struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or blank file is an empty map.
    pub(crate) async fn load(&self) -> Result<PriceMap, PriceStoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PriceMap::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(PriceMap::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "price file is corrupt");
            PriceStoreError::Corrupt {
                path: self.path.display().to_string(),
                source: e,
            }
        })
    }

    /// Writes `<name>.tmp`, syncs it, then renames it over the target.
    pub(crate) async fn persist(&self, prices: &PriceMap) -> Result<(), PriceStoreError> {
        let mut body = serde_json::to_vec_pretty(prices).map_err(PriceStoreError::Encode)?;
        body.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let tmp_path = self.tmp_path();
        if let Err(e) = write_synced(&tmp_path, &body).await {
            tracing::error!(path = %tmp_path.display(), error = %e, "failed to write temp price file");
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(self.io_error(e));
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            tracing::error!(path = %self.path.display(), error = %e, "failed to replace price file");
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(self.io_error(e));
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> PriceStoreError {
        PriceStoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

async fn write_synced(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(body).await?;
    file.sync_all().await
}

/// Reads a price file without opening a store, e.g. to copy a legacy JSON
/// file into another backend.
///
/// # Errors
///
/// Returns [`PriceStoreError::Io`] or [`PriceStoreError::Corrupt`].
pub async fn read_price_file(path: impl Into<PathBuf>) -> Result<PriceMap, PriceStoreError> {
    JsonFile::new(path.into()).load().await
}

#[cfg(test)]
mod tests {
    use catalog_core::PriceFact;

    use super::*;

    #[tokio::test]
    async fn tmp_name_sits_next_to_target() {
        let file = JsonFile::new(PathBuf::from("/srv/data/current_prices.json"));
        assert_eq!(
            file.tmp_path(),
            PathBuf::from("/srv/data/current_prices.json.tmp")
        );
    }

    #[tokio::test]
    async fn blank_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.json");
        std::fs::write(&path, "  \n").unwrap();
        assert!(read_price_file(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn persist_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFile::new(dir.path().join("nested").join("prices.json"));
        let mut prices = PriceMap::new();
        prices.insert(
            "SKU".to_string(),
            PriceFact::new(10.0, None, "RUB", true).unwrap(),
        );

        file.persist(&prices).await.unwrap();

        assert_eq!(file.load().await.unwrap(), prices);
        assert!(!file.tmp_path().exists());
    }
}
