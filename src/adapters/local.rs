use crate::domain::ports::DataSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalDataSource {
    base_path: PathBuf,
}

impl LocalDataSource {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl DataSource for LocalDataSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(path);
        let data = tokio::fs::read(&full_path).await.map_err(|e| {
            std::io::Error::new(e.kind(), format!("{}: {}", full_path.display(), e))
        })?;
        Ok(data)
    }

    fn describe(&self) -> String {
        self.base_path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_reads_relative_to_base() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("iwate")).unwrap();
        std::fs::write(temp_dir.path().join("iwate/border.geojson"), b"{}").unwrap();

        let source = LocalDataSource::new(temp_dir.path());
        assert_eq!(source.fetch("iwate/border.geojson").await.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_missing_file_names_path() {
        let temp_dir = TempDir::new().unwrap();
        let source = LocalDataSource::new(temp_dir.path());

        let err = source.fetch("nope/mesh.geojson").await.unwrap_err();
        assert!(err.to_string().contains("mesh.geojson"));
    }
}
