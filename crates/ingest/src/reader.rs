use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

pub struct FileReader;

impl FileReader {
    pub async fn read_file(path: &Path) -> Result<String> {
        let content = fs::read_to_string(path)
            .await
            .context(format!("Failed to read file: {:?}", path))?;
        Ok(content)
    }

    pub async fn read_export(path: &Path) -> Result<String> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match extension {
            "json" => Self::read_file(path).await,
            _ => anyhow::bail!("Unsupported export format: {:?}", path),
        }
    }

    /// All `*.json` files under `dir`, in path order
    pub fn find_exports(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.context(format!("Failed to walk directory: {:?}", dir))?;
            let path = entry.path();

            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    pub async fn read_exports(dir: &Path) -> Result<Vec<(PathBuf, String)>> {
        let mut files = Vec::new();

        for path in Self::find_exports(dir)? {
            let content = Self::read_file(&path).await?;
            files.push((path, content));
        }

        Ok(files)
    }
}
